//! systemd backend
//!
//! Setup:
//! 1. create the unit directory and render `<name>.service`
//! 2. `systemctl [--user] daemon-reload`
//! 3. `systemctl [--user] enable <name>`
//! 4. `systemctl [--user] start <name>`
//! 5. `systemctl [--user] status <name>` must report `active (running)`
//!
//! Teardown:
//! 1. `systemctl [--user] stop <name>` (a unit that is not loaded skips to 4)
//! 2. `systemctl [--user] is-active <name>` must print `inactive`
//! 3. `systemctl [--user] disable <name>`
//! 4. remove the unit file, then optionally the working directory

use std::path::PathBuf;

use super::{remove_path, run_step, GuardError, InitBackend, Outcome, Step};
use crate::command::CommandRunner;
use crate::fs;
use crate::host::HostProfile;
use crate::render;
use crate::units::{self, ServiceDescriptor};

/// Mode of a unit directory created by setup
const UNIT_DIR_MODE: u32 = 0o755;

pub struct Systemd<'a, R> {
    profile: &'a HostProfile,
    runner: &'a R,
}

impl<'a, R: CommandRunner> Systemd<'a, R> {
    pub fn new(profile: &'a HostProfile, runner: &'a R) -> Self {
        Self { profile, runner }
    }

    fn systemctl(&self, verb: &str, name: Option<&str>) -> String {
        match name {
            Some(name) => format!("{} {} {}", self.profile.systemctl(), verb, name),
            None => format!("{} {}", self.profile.systemctl(), verb),
        }
    }

    async fn step(&self, step: Step, name: &str, line: &str) -> Result<Outcome, GuardError> {
        run_step(self.runner, step, name, line).await
    }
}

impl<R: CommandRunner> InitBackend for Systemd<'_, R> {
    fn artifact_path(&self, d: &ServiceDescriptor) -> PathBuf {
        render::unit_path(&self.profile.unit_dir, &d.name)
    }

    fn render(&self, d: &ServiceDescriptor) -> String {
        render::systemd_unit(d)
    }

    async fn write_artifact(&self, d: &ServiceDescriptor) -> Result<PathBuf, GuardError> {
        let dir = &self.profile.unit_dir;
        fs::create_dir_recursive(dir, UNIT_DIR_MODE)
            .await
            .map_err(|source| GuardError::Prepare {
                path: dir.clone(),
                source,
            })?;
        render::write_systemd_unit(dir, d).await
    }

    async fn installed(&self, name: &str) -> Result<ServiceDescriptor, GuardError> {
        let path = render::unit_path(&self.profile.unit_dir, name);
        Ok(units::load_installed(name, &path).await?)
    }

    async fn setup(&self, d: &ServiceDescriptor) -> Result<(), GuardError> {
        let name = d.name.as_str();

        self.write_artifact(d).await?;

        self.step(Step::DaemonReload, name, &self.systemctl("daemon-reload", None))
            .await?;
        self.step(Step::Enable, name, &self.systemctl("enable", Some(name)))
            .await?;
        self.step(Step::Start, name, &self.systemctl("start", Some(name)))
            .await?;
        self.step(Step::Status, name, &self.systemctl("status", Some(name)))
            .await?;

        log::info!("{} is active (running)", name);
        Ok(())
    }

    async fn teardown(
        &self,
        d: &ServiceDescriptor,
        delete_working_directory: bool,
    ) -> Result<(), GuardError> {
        let name = d.name.as_str();

        let stopped = self
            .step(Step::Stop, name, &self.systemctl("stop", Some(name)))
            .await?;

        // A unit systemd never loaded has nothing to verify or disable
        if stopped == Outcome::Success {
            self.step(Step::IsActive, name, &self.systemctl("is-active", Some(name)))
                .await?;
            self.step(Step::Disable, name, &self.systemctl("disable", Some(name)))
                .await?;
        }

        remove_path(name, &self.artifact_path(d)).await?;

        if delete_working_directory {
            remove_path(name, &d.working_directory).await?;
        }

        log::info!("{} removed", name);
        Ok(())
    }
}
