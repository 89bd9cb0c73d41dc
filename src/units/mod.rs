//! Service descriptors and unit file reading
//!
//! A [`ServiceDescriptor`] is what callers hand to the lifecycle engine.
//! The parser reads rendered unit files back so an installed service can be
//! inspected or removed knowing only its name.

mod descriptor;
mod parser;

pub use descriptor::{DescriptorError, ServiceDescriptor};
pub use parser::{last_value, parse_file, parse_unit_file, ParseError, ParsedFile, ParsedSection};

use std::path::Path;

/// Load the descriptor of an installed systemd unit
pub async fn load_installed(
    name: &str,
    unit_path: &Path,
) -> Result<ServiceDescriptor, DescriptorError> {
    let parsed = parse_unit_file(unit_path)
        .await
        .map_err(|e| DescriptorError::Unit(name.to_string(), e))?;
    ServiceDescriptor::from_unit(name, &parsed)
}
