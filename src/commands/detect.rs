//! Show the detected host profile

use sysguard::host;
use sysguard::{CommandRunner, ServiceGuard};

pub fn detect<R: CommandRunner>(guard: &ServiceGuard<R>) -> Result<(), Box<dyn std::error::Error>> {
    let profile = guard.profile();

    println!("    Backend: {}", profile.backend);
    println!("  Privilege: {}", profile.privilege);
    println!("    UnitDir: {}", profile.unit_dir.display());
    println!("  ScriptDir: {}", profile.script_dir.display());
    println!("  Systemctl: {}", profile.systemctl());
    println!("  ShellUser: {}", host::shell_user()?);

    match host::executable_owner() {
        Ok(owner) => println!("  ExecOwner: {}", owner),
        Err(e) => log::warn!("{}", e),
    }

    Ok(())
}
