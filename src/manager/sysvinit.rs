//! SysVinit backend
//!
//! Setup renders `/etc/init.d/<name>`, registers it with `chkconfig` for
//! runlevels 3, 4 and 5, starts it with `service` and checks its status.
//! Teardown walks the same steps backwards.

use std::path::PathBuf;

use super::{remove_path, run_step, GuardError, InitBackend, Outcome, Step};
use crate::command::CommandRunner;
use crate::host::HostProfile;
use crate::render;
use crate::units::{DescriptorError, ParseError, ServiceDescriptor};

/// Runlevels the service is enabled in
const RUNLEVELS: &str = "345";

pub struct SysVinit<'a, R> {
    profile: &'a HostProfile,
    runner: &'a R,
}

impl<'a, R: CommandRunner> SysVinit<'a, R> {
    pub fn new(profile: &'a HostProfile, runner: &'a R) -> Self {
        Self { profile, runner }
    }

    async fn step(&self, step: Step, name: &str, line: &str) -> Result<Outcome, GuardError> {
        run_step(self.runner, step, name, line).await
    }
}

impl<R: CommandRunner> InitBackend for SysVinit<'_, R> {
    fn artifact_path(&self, d: &ServiceDescriptor) -> PathBuf {
        render::script_path(&self.profile.script_dir, &d.name)
    }

    fn render(&self, d: &ServiceDescriptor) -> String {
        render::sysvinit_script(d)
    }

    async fn write_artifact(&self, d: &ServiceDescriptor) -> Result<PathBuf, GuardError> {
        render::write_sysvinit_script(&self.profile.script_dir, d).await
    }

    async fn installed(&self, name: &str) -> Result<ServiceDescriptor, GuardError> {
        let path = render::script_path(&self.profile.script_dir, name);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| DescriptorError::Unit(name.to_string(), ParseError::Io(e)))?;
        Ok(parse_script(name, &content)?)
    }

    async fn setup(&self, d: &ServiceDescriptor) -> Result<(), GuardError> {
        let name = d.name.as_str();

        self.write_artifact(d).await?;

        self.step(Step::ChkconfigAdd, name, &format!("chkconfig --add {}", name))
            .await?;
        self.step(
            Step::ChkconfigOn,
            name,
            &format!("chkconfig --level {} {} on", RUNLEVELS, name),
        )
        .await?;
        self.step(Step::ServiceStart, name, &format!("service {} start", name))
            .await?;
        self.step(Step::ServiceStatus, name, &format!("service {} status", name))
            .await?;

        log::info!("{} is running", name);
        Ok(())
    }

    async fn teardown(
        &self,
        d: &ServiceDescriptor,
        delete_working_directory: bool,
    ) -> Result<(), GuardError> {
        let name = d.name.as_str();

        self.step(Step::ServiceStop, name, &format!("service {} stop", name))
            .await?;
        self.step(
            Step::ServiceStoppedStatus,
            name,
            &format!("service {} status", name),
        )
        .await?;
        self.step(
            Step::ChkconfigOff,
            name,
            &format!("chkconfig --level {} {} off", RUNLEVELS, name),
        )
        .await?;
        self.step(Step::ChkconfigDel, name, &format!("chkconfig --del {}", name))
            .await?;

        remove_path(name, &self.artifact_path(d)).await?;

        if delete_working_directory {
            remove_path(name, &d.working_directory).await?;
        }

        log::info!("{} removed", name);
        Ok(())
    }
}

/// Read the descriptor fields back out of a rendered init script
fn parse_script(name: &str, content: &str) -> Result<ServiceDescriptor, DescriptorError> {
    let missing = |key: &str| {
        DescriptorError::Unit(
            name.to_string(),
            ParseError::MissingSetting("init script".to_string(), key.to_string()),
        )
    };

    let mut description = None;
    let mut working_directory = None;
    let mut exec_start = None;

    for line in content.lines() {
        if let Some(v) = line.strip_prefix("# Description: ") {
            description.get_or_insert_with(|| v.to_string());
        } else if let Some(v) = line.strip_prefix("BASEDIR=\"") {
            working_directory = v.strip_suffix('"').map(PathBuf::from);
        } else if let Some(v) = line.strip_prefix("SERVICE_CMD='") {
            exec_start = v.strip_suffix('\'').map(str::to_string);
        }
    }

    Ok(ServiceDescriptor {
        name: name.to_string(),
        description: description.ok_or_else(|| missing("Description"))?,
        working_directory: working_directory.ok_or_else(|| missing("BASEDIR"))?,
        exec_start: exec_start.ok_or_else(|| missing("SERVICE_CMD"))?,
    })
}
