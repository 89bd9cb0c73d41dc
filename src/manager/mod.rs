//! Service lifecycle management
//!
//! Installs, verifies and removes a service through the host's init system.
//! Every supervisor command is followed by classification of its output;
//! the first failing step aborts the sequence and is reported to the caller.
//! Nothing is retried or rolled back.

mod classify;
mod systemd;
mod sysvinit;

pub use classify::{classify, Outcome, Step, EXIT_INACTIVE, EXIT_NOT_FOUND, EXIT_NOT_LOADED};
pub use systemd::Systemd;
pub use sysvinit::SysVinit;

use std::path::{Path, PathBuf};

use crate::command::{CommandError, CommandRunner};
use crate::fs;
use crate::host::{Backend, HostError, HostProfile};
use crate::units::{DescriptorError, ServiceDescriptor};

#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("Failed to create directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Artifact {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("{step} failed for {name} ({reason})! stdout: {stdout} stderr: {stderr}")]
    Step {
        step: Step,
        name: String,
        reason: String,
        stdout: String,
        stderr: String,
        /// Exit status of the command, `None` when it was killed by a signal
        status: Option<i32>,
    },

    #[error("Failed to remove {path} for {name}: {source}")]
    Cleanup {
        name: String,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl GuardError {
    /// The lifecycle step that failed, if this is a classification error
    pub fn step(&self) -> Option<Step> {
        match self {
            GuardError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Operations every init system backend provides
#[allow(async_fn_in_trait)]
pub trait InitBackend {
    /// Where the artifact for `d` lives
    fn artifact_path(&self, d: &ServiceDescriptor) -> PathBuf;

    /// Artifact text for `d`
    fn render(&self, d: &ServiceDescriptor) -> String;

    /// Write the artifact for `d`, returning its path
    async fn write_artifact(&self, d: &ServiceDescriptor) -> Result<PathBuf, GuardError>;

    /// Recover the descriptor of an installed service from its artifact
    async fn installed(&self, name: &str) -> Result<ServiceDescriptor, GuardError>;

    /// Install, enable, start and verify
    async fn setup(&self, d: &ServiceDescriptor) -> Result<(), GuardError>;

    /// Stop, verify, disable and remove
    async fn teardown(
        &self,
        d: &ServiceDescriptor,
        delete_working_directory: bool,
    ) -> Result<(), GuardError>;
}

/// Run one lifecycle command and classify its result
pub(crate) async fn run_step<R: CommandRunner>(
    runner: &R,
    step: Step,
    name: &str,
    line: &str,
) -> Result<Outcome, GuardError> {
    log::info!("[{}] {}", name, line);
    let out = runner.run(line).await?;

    match classify(step, name, &out) {
        Outcome::Failure(reason) => {
            log::error!("[{}] {} failed: {}", name, step, reason);
            Err(GuardError::Step {
                step,
                name: name.to_string(),
                reason,
                stdout: out.stdout,
                stderr: out.stderr,
                status: out.status,
            })
        }
        Outcome::Tolerated(reason) => {
            log::warn!("[{}] {}: {}, continuing", name, step, reason);
            Ok(Outcome::Tolerated(reason))
        }
        Outcome::Success => Ok(Outcome::Success),
    }
}

/// Delete a rendered artifact or working directory as part of teardown
pub(crate) async fn remove_path(name: &str, path: &Path) -> Result<(), GuardError> {
    fs::delete_recursive(path)
        .await
        .map_err(|source| GuardError::Cleanup {
            name: name.to_string(),
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("[{}] Removed {}", name, path.display());
    Ok(())
}

/// Entry point for callers: routes lifecycle verbs to the backend fixed in the host profile
pub struct ServiceGuard<R> {
    profile: HostProfile,
    runner: R,
}

impl<R: CommandRunner> ServiceGuard<R> {
    pub fn new(profile: HostProfile, runner: R) -> Self {
        Self { profile, runner }
    }

    pub fn profile(&self) -> &HostProfile {
        &self.profile
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Install and start `d`, verifying it is running
    pub async fn setup_service(&self, d: &ServiceDescriptor) -> Result<(), GuardError> {
        d.validate()?;
        log::info!("Setting up {} with {}", d.name, self.profile.backend);
        match self.profile.backend {
            Backend::Systemd => self.systemd().setup(d).await,
            Backend::SysVinit => self.sysvinit().setup(d).await,
        }
    }

    /// Stop and remove `d`, optionally deleting its working directory
    pub async fn unsetup_service(
        &self,
        d: &ServiceDescriptor,
        delete_working_directory: bool,
    ) -> Result<(), GuardError> {
        d.validate()?;
        if delete_working_directory && d.working_directory.parent().is_none() {
            return Err(DescriptorError::InvalidWorkingDirectory(
                d.name.clone(),
                format!("refusing to delete {}", d.working_directory.display()),
            )
            .into());
        }
        log::info!("Removing {} with {}", d.name, self.profile.backend);
        match self.profile.backend {
            Backend::Systemd => self.systemd().teardown(d, delete_working_directory).await,
            Backend::SysVinit => self.sysvinit().teardown(d, delete_working_directory).await,
        }
    }

    /// Artifact text for `d` without writing anything
    pub fn render_artifact(&self, d: &ServiceDescriptor) -> String {
        match self.profile.backend {
            Backend::Systemd => self.systemd().render(d),
            Backend::SysVinit => self.sysvinit().render(d),
        }
    }

    pub fn artifact_path(&self, d: &ServiceDescriptor) -> PathBuf {
        match self.profile.backend {
            Backend::Systemd => self.systemd().artifact_path(d),
            Backend::SysVinit => self.sysvinit().artifact_path(d),
        }
    }

    /// Descriptor of an installed service, read back from its artifact
    pub async fn installed_service(&self, name: &str) -> Result<ServiceDescriptor, GuardError> {
        match self.profile.backend {
            Backend::Systemd => self.systemd().installed(name).await,
            Backend::SysVinit => self.sysvinit().installed(name).await,
        }
    }

    fn systemd(&self) -> Systemd<'_, R> {
        Systemd::new(&self.profile, &self.runner)
    }

    fn sysvinit(&self) -> SysVinit<'_, R> {
        SysVinit::new(&self.profile, &self.runner)
    }
}
