//! Service descriptor: the caller's description of the worker to install

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::parser::{last_value, ParseError, ParsedFile};

/// Characters allowed in a service name besides ASCII alphanumerics.
/// The name is embedded unquoted in shell lines and used as a file name.
const NAME_EXTRA_CHARS: &[char] = &['-', '_', '.', '@', ':'];

/// Characters allowed in the working directory besides ASCII alphanumerics.
/// The path is embedded in the init script and in unit file settings.
const PATH_EXTRA_CHARS: &[char] = &['/', '-', '_', '.', '@', ':', '+', ',', '=', '%'];

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("Invalid service name '{0}': {1}")]
    InvalidName(String, &'static str),

    #[error("Invalid working directory for {0}: {1}")]
    InvalidWorkingDirectory(String, String),

    #[error("Invalid ExecStart for {0}: {1}")]
    InvalidExecStart(String, &'static str),

    #[error("Invalid description for {0}: {1}")]
    InvalidDescription(String, &'static str),

    #[error("Failed to read descriptor {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to decode descriptor {0}: {1}")]
    Decode(PathBuf, serde_json::Error),

    #[error("Failed to read unit for {0}: {1}")]
    Unit(String, ParseError),
}

/// Immutable description of a service to manage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Unique identifier, also the base name of the unit file or init script
    pub name: String,
    /// Free text shown by the supervisor
    pub description: String,
    /// Absolute path the worker runs from
    pub working_directory: PathBuf,
    /// Full command line launching the worker
    pub exec_start: String,
}

impl ServiceDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        working_directory: impl Into<PathBuf>,
        exec_start: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            working_directory: working_directory.into(),
            exec_start: exec_start.into(),
        }
    }

    /// Load a descriptor stored as JSON
    pub async fn from_json_file(path: &Path) -> Result<Self, DescriptorError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DescriptorError::Read(path.to_path_buf(), e))?;
        serde_json::from_str(&content).map_err(|e| DescriptorError::Decode(path.to_path_buf(), e))
    }

    /// Rebuild a descriptor from an installed unit file
    pub fn from_unit(name: &str, parsed: &ParsedFile) -> Result<Self, DescriptorError> {
        let field = |section: &str, key: &str| {
            last_value(parsed, section, key)
                .map(str::to_string)
                .map_err(|e| DescriptorError::Unit(name.to_string(), e))
        };

        Ok(Self {
            name: name.to_string(),
            description: field("[Unit]", "Description")?,
            working_directory: PathBuf::from(field("[Service]", "WorkingDirectory")?),
            exec_start: field("[Service]", "ExecStart")?,
        })
    }

    /// Check that every field can be embedded into shell lines, paths and artifacts as-is.
    ///
    /// Unit files drop empty settings and trim values, so anything that would
    /// not read back unchanged is rejected here.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        validate_name(&self.name)?;

        let invalid_description =
            |reason| Err(DescriptorError::InvalidDescription(self.name.clone(), reason));
        if self.description.trim().is_empty() {
            return invalid_description("must not be empty");
        }
        if self.description.contains(['\n', '\r']) {
            return invalid_description("must be a single line");
        }
        if self.description.trim() != self.description {
            return invalid_description("must not start or end with whitespace");
        }

        validate_working_directory(&self.name, &self.working_directory)?;

        // The init script quotes the command line with single quotes
        if self.exec_start.contains(['\'', '\n', '\r']) {
            return Err(DescriptorError::InvalidExecStart(
                self.name.clone(),
                "must not contain single quotes or line breaks",
            ));
        }
        if self.exec_start.trim() != self.exec_start {
            return Err(DescriptorError::InvalidExecStart(
                self.name.clone(),
                "must not start or end with whitespace",
            ));
        }
        match shlex::split(&self.exec_start) {
            Some(parts) if !parts.is_empty() => Ok(()),
            Some(_) => Err(DescriptorError::InvalidExecStart(self.name.clone(), "is empty")),
            None => Err(DescriptorError::InvalidExecStart(
                self.name.clone(),
                "has unbalanced shell quoting",
            )),
        }
    }
}

fn validate_working_directory(name: &str, wd: &Path) -> Result<(), DescriptorError> {
    let invalid = |reason: String| {
        Err(DescriptorError::InvalidWorkingDirectory(name.to_string(), reason))
    };

    if !wd.is_absolute() {
        return invalid(format!("{} is not absolute", wd.display()));
    }
    let Some(wd_str) = wd.to_str() else {
        return invalid(format!("{} is not valid UTF-8", wd.display()));
    };
    if let Some(c) = wd_str
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !PATH_EXTRA_CHARS.contains(c))
    {
        return invalid(format!("{} contains {:?}", wd_str, c));
    }
    if wd.components().any(|c| c == Component::ParentDir) {
        return invalid(format!("{} contains '..'", wd_str));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), DescriptorError> {
    let invalid = |reason| Err(DescriptorError::InvalidName(name.to_string(), reason));

    if name.is_empty() {
        return invalid("name is empty");
    }
    if name == "." || name == ".." || name.starts_with('-') {
        return invalid("name is not a valid file name");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || NAME_EXTRA_CHARS.contains(&c))
    {
        return invalid("only ASCII letters, digits and -_.@: are allowed");
    }
    Ok(())
}
