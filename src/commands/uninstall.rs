//! Stop and remove a service

use sysguard::{CommandRunner, ServiceGuard};

use super::descriptor_from_args;
use crate::DescriptorArgs;

pub async fn uninstall<R: CommandRunner>(
    guard: &ServiceGuard<R>,
    args: &DescriptorArgs,
    delete_working_directory: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // A bare name is resolved through the installed artifact
    let descriptor = match (&args.descriptor, &args.name, &args.exec_start) {
        (None, Some(name), None) => guard.installed_service(name).await?,
        _ => descriptor_from_args(args).await?,
    };

    let artifact = guard.artifact_path(&descriptor);
    guard
        .unsetup_service(&descriptor, delete_working_directory)
        .await?;

    println!("● {} - removed ({})", descriptor.name, artifact.display());
    if delete_working_directory {
        println!("  deleted {}", descriptor.working_directory.display());
    }

    Ok(())
}
