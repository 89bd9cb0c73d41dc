//! Install and start a service

use sysguard::{CommandRunner, ServiceGuard};

use super::descriptor_from_args;
use crate::DescriptorArgs;

pub async fn install<R: CommandRunner>(
    guard: &ServiceGuard<R>,
    args: &DescriptorArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let descriptor = descriptor_from_args(args).await?;

    guard.setup_service(&descriptor).await?;

    println!(
        "● {} - installed and running ({})",
        descriptor.name,
        guard.artifact_path(&descriptor).display()
    );

    Ok(())
}
