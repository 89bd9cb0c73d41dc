//! INI-style unit file parser
//!
//! Reads rendered unit files back into sections of key/value pairs.
//! Values are kept whole: an `ExecStart=` or `Description=` line may
//! legitimately contain commas and spaces.

use std::collections::HashMap;
use std::path::Path;

/// A section maps upper-cased keys to every value they were given, in file order
pub type ParsedSection = HashMap<String, Vec<String>>;

/// A parsed unit file is a map of section headers (e.g. `[Service]`) to their contents
pub type ParsedFile = HashMap<String, ParsedSection>;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Section '{0}' appears more than once")]
    DuplicateSection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing section {0}")]
    MissingSection(String),

    #[error("Missing setting {1} in section {0}")]
    MissingSetting(String, String),
}

/// Parse a unit file from a string
pub fn parse_file(content: &str) -> Result<ParsedFile, ParseError> {
    let mut sections = HashMap::new();
    let mut current: Option<(String, ParsedSection)> = None;

    for line in content.lines().map(str::trim) {
        if line.starts_with('[') {
            if let Some((name, section)) = current.take() {
                insert_section(&mut sections, name, section)?;
            }
            current = Some((line.to_string(), HashMap::new()));
            continue;
        }

        // Lines before the first section are ignored
        let Some((_, section)) = current.as_mut() else {
            continue;
        };

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        section
            .entry(key.trim().to_uppercase())
            .or_default()
            .push(value.to_string());
    }

    if let Some((name, section)) = current {
        insert_section(&mut sections, name, section)?;
    }

    Ok(sections)
}

fn insert_section(
    sections: &mut ParsedFile,
    name: String,
    section: ParsedSection,
) -> Result<(), ParseError> {
    if sections.contains_key(&name) {
        return Err(ParseError::DuplicateSection(name));
    }
    sections.insert(name, section);
    Ok(())
}

/// Look up the last value of `key` in `section`, the one systemd would honour
pub fn last_value<'a>(
    parsed: &'a ParsedFile,
    section: &str,
    key: &str,
) -> Result<&'a str, ParseError> {
    let entries = parsed
        .get(section)
        .ok_or_else(|| ParseError::MissingSection(section.to_string()))?;

    entries
        .get(&key.to_uppercase())
        .and_then(|vals| vals.last())
        .map(String::as_str)
        .ok_or_else(|| ParseError::MissingSetting(section.to_string(), key.to_string()))
}

/// Parse a unit file from disk
pub async fn parse_unit_file(path: &Path) -> Result<ParsedFile, ParseError> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_file(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_service() {
        let content = r#"
[Unit]
Description=Test Service
After=network.target

[Service]
Type=simple
ExecStart=/usr/bin/test

[Install]
WantedBy=multi-user.target
"#;
        let parsed = parse_file(content).unwrap();

        assert!(parsed.contains_key("[Unit]"));
        assert!(parsed.contains_key("[Service]"));
        assert!(parsed.contains_key("[Install]"));
        assert_eq!(parsed["[Unit]"]["DESCRIPTION"], vec!["Test Service"]);
    }

    #[test]
    fn test_empty_file() {
        let parsed = parse_file("").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_comments_only() {
        let content = "# This is a comment\n; Another comment\n";
        let parsed = parse_file(content).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_comments_inside_section() {
        let content = r#"
[Unit]
# This is a comment
Description=Test
; Another comment
After=network.target
"#;
        let parsed = parse_file(content).unwrap();
        assert_eq!(parsed["[Unit]"].len(), 2);
    }

    #[test]
    fn test_values_are_not_split() {
        let content = r#"
[Unit]
Description=Exporter, collects host metrics

[Service]
ExecStart=/opt/exporter/bin/run --listen 0.0.0.0:9100,127.0.0.1:9101 -v
"#;
        let parsed = parse_file(content).unwrap();
        assert_eq!(
            last_value(&parsed, "[Unit]", "Description").unwrap(),
            "Exporter, collects host metrics"
        );
        assert_eq!(
            last_value(&parsed, "[Service]", "ExecStart").unwrap(),
            "/opt/exporter/bin/run --listen 0.0.0.0:9100,127.0.0.1:9101 -v"
        );
    }

    #[test]
    fn test_value_with_equals() {
        let content = "[Service]\nEnvironment=FOO=bar=baz\n";
        let parsed = parse_file(content).unwrap();
        assert_eq!(parsed["[Service]"]["ENVIRONMENT"], vec!["FOO=bar=baz"]);
    }

    #[test]
    fn test_last_value_wins() {
        let content = r#"
[Unit]
description=Lower
Description=Mixed
"#;
        let parsed = parse_file(content).unwrap();
        assert_eq!(parsed["[Unit]"]["DESCRIPTION"].len(), 2);
        assert_eq!(last_value(&parsed, "[Unit]", "DESCRIPTION").unwrap(), "Mixed");
    }

    #[test]
    fn test_whitespace_handling() {
        let content = "[Unit]\n   Description   =   Test Service\n";
        let parsed = parse_file(content).unwrap();
        assert_eq!(parsed["[Unit]"]["DESCRIPTION"], vec!["Test Service"]);
    }

    #[test]
    fn test_duplicate_section_error() {
        let content = r#"
[Unit]
Description=First

[Unit]
Description=Second
"#;
        let result = parse_file(content);
        assert!(matches!(result.unwrap_err(), ParseError::DuplicateSection(_)));
    }

    #[test]
    fn test_missing_section_and_setting() {
        let parsed = parse_file("[Unit]\nDescription=x\n").unwrap();
        assert!(matches!(
            last_value(&parsed, "[Service]", "ExecStart"),
            Err(ParseError::MissingSection(_))
        ));
        assert!(matches!(
            last_value(&parsed, "[Unit]", "After"),
            Err(ParseError::MissingSetting(_, _))
        ));
    }

    #[test]
    fn test_lines_before_first_section() {
        let content = "# Header comment\nStray=value\n\n[Unit]\nDescription=Test\n";
        let parsed = parse_file(content).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(parsed.contains_key("[Unit]"));
    }
}
