//! Print the artifact a service would be installed with

use sysguard::{CommandRunner, ServiceGuard};

use super::descriptor_from_args;
use crate::DescriptorArgs;

pub async fn render<R: CommandRunner>(
    guard: &ServiceGuard<R>,
    args: &DescriptorArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let descriptor = descriptor_from_args(args).await?;
    descriptor.validate()?;

    println!("# {}", guard.artifact_path(&descriptor).display());
    print!("{}", guard.render_artifact(&descriptor));

    Ok(())
}
