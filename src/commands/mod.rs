mod detect;
mod install;
mod render;
mod show;
mod uninstall;

pub use detect::detect;
pub use install::install;
pub use render::render;
pub use show::show;
pub use uninstall::uninstall;

use sysguard::ServiceDescriptor;

use crate::DescriptorArgs;

/// Build a descriptor from a JSON file or from individual flags
async fn descriptor_from_args(
    args: &DescriptorArgs,
) -> Result<ServiceDescriptor, Box<dyn std::error::Error>> {
    if let Some(path) = &args.descriptor {
        return Ok(ServiceDescriptor::from_json_file(path).await?);
    }

    let name = args.name.as_deref().ok_or("--name or --descriptor is required")?;
    let working_directory = args
        .working_directory
        .clone()
        .ok_or("--working-directory is required without --descriptor")?;
    let exec_start = args
        .exec_start
        .clone()
        .ok_or("--exec-start is required without --descriptor")?;
    let description = args.description.clone().unwrap_or_else(|| name.to_string());

    Ok(ServiceDescriptor::new(name, description, working_directory, exec_start))
}
