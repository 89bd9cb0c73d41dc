//! Show an installed service

use sysguard::{CommandRunner, ServiceGuard};

pub async fn show<R: CommandRunner>(
    guard: &ServiceGuard<R>,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let descriptor = guard.installed_service(name).await?;

    println!("● {} - {}", descriptor.name, descriptor.description);
    println!("       Path: {}", guard.artifact_path(&descriptor).display());
    println!("    Backend: {}", guard.profile().backend);
    println!(" WorkingDir: {}", descriptor.working_directory.display());
    println!("  ExecStart: {}", descriptor.exec_start);

    Ok(())
}
