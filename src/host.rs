//! Host detection
//!
//! Decides once, at startup, which init system drives services and whether
//! artifacts are installed system-wide or for the current user only. The
//! result is a [`HostProfile`] that is handed to the lifecycle engine.

use std::fmt;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use nix::unistd::{geteuid, Uid, User};

use crate::fs;

/// Pseudo-file holding the command name of PID 1 (Linux 2.6.33+)
pub const PROC1_COMM: &str = "/proc/1/comm";

/// Unit directory used when running as root
pub const ROOT_UNIT_DIR: &str = "/lib/systemd/system";

/// Unit directory below $HOME used in a user session
pub const USER_UNIT_SUBDIR: &str = ".config/systemd/user";

/// Directory for SysVinit scripts
pub const SYSVINIT_SCRIPT_DIR: &str = "/etc/init.d";

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Cannot determine current user: {0}")]
    CurrentUser(String),

    #[error("Cannot determine home directory of the current user")]
    NoHomeDir,

    #[error("Cannot determine owner of {0}: {1}")]
    ExecutableOwner(PathBuf, String),
}

/// Init system driving services on this host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Systemd,
    SysVinit,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Systemd => "systemd",
            Backend::SysVinit => "sysvinit",
        }
    }

    /// Parse a backend name as given on the command line
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "systemd" => Some(Backend::Systemd),
            "sysvinit" | "sysv" | "init" => Some(Backend::SysVinit),
            _ => None,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether artifacts are installed for the whole host or for one user session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivilegeMode {
    RootWide,
    UserSession,
}

impl PrivilegeMode {
    pub fn from_username(name: &str) -> Self {
        if name == "root" {
            PrivilegeMode::RootWide
        } else {
            PrivilegeMode::UserSession
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrivilegeMode::RootWide => "root",
            PrivilegeMode::UserSession => "user",
        }
    }
}

impl fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map the content of /proc/1/comm to a backend.
///
/// Anything other than `systemd` falls back to SysVinit.
pub fn backend_from_comm(content: &str) -> Backend {
    match content.trim() {
        "systemd" => Backend::Systemd,
        "init" => Backend::SysVinit,
        "" => {
            log::warn!("{} is empty, unknown init system, trying SysVinit", PROC1_COMM);
            Backend::SysVinit
        }
        other => {
            log::warn!(
                "{} is {}, unknown init system, trying SysVinit",
                PROC1_COMM,
                other
            );
            Backend::SysVinit
        }
    }
}

/// Probe the PID 1 command name. Never fails: unreadable probes select SysVinit.
pub async fn detect_backend(probe: &Path) -> Backend {
    if !fs::path_exists(probe).await {
        log::warn!(
            "{} not found, unknown init system, trying SysVinit",
            probe.display()
        );
        return Backend::SysVinit;
    }

    match fs::read_file_bytes(probe).await {
        Ok(bytes) => {
            let backend = backend_from_comm(&String::from_utf8_lossy(&bytes));
            log::info!("{} setup", backend);
            backend
        }
        Err(e) => {
            log::warn!(
                "Failed to read {}: {}, trying SysVinit",
                probe.display(),
                e
            );
            Backend::SysVinit
        }
    }
}

/// Name of the effective user running this process
pub fn current_username() -> Result<String, HostError> {
    let uid = geteuid();
    User::from_uid(uid)
        .map_err(|e| HostError::CurrentUser(e.to_string()))?
        .map(|u| u.name)
        .ok_or_else(|| HostError::CurrentUser(format!("no passwd entry for uid {}", uid)))
}

/// User who opened the shell, looking through `sudo`
pub fn shell_user() -> Result<String, HostError> {
    match std::env::var("SUDO_USER") {
        Ok(user) if !user.is_empty() => Ok(user),
        _ => current_username(),
    }
}

/// Owner of the running executable
pub fn executable_owner() -> Result<String, HostError> {
    let exe = std::env::current_exe()
        .map_err(|e| HostError::ExecutableOwner(PathBuf::from("<current exe>"), e.to_string()))?;
    let meta = std::fs::metadata(&exe)
        .map_err(|e| HostError::ExecutableOwner(exe.clone(), e.to_string()))?;
    let uid = Uid::from_raw(meta.uid());

    User::from_uid(uid)
        .map_err(|e| HostError::ExecutableOwner(exe.clone(), e.to_string()))?
        .map(|u| u.name)
        .ok_or_else(|| HostError::ExecutableOwner(exe, format!("no passwd entry for uid {}", uid)))
}

/// Facts about the host, fixed for the lifetime of the process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProfile {
    pub backend: Backend,
    pub privilege: PrivilegeMode,
    /// Where systemd unit files are written
    pub unit_dir: PathBuf,
    /// Where SysVinit scripts are written
    pub script_dir: PathBuf,
}

impl HostProfile {
    /// Build a profile from known facts. `home` is only consulted in user-session mode.
    pub fn new(
        backend: Backend,
        privilege: PrivilegeMode,
        home: Option<&Path>,
    ) -> Result<Self, HostError> {
        let unit_dir = match privilege {
            PrivilegeMode::RootWide => PathBuf::from(ROOT_UNIT_DIR),
            PrivilegeMode::UserSession => home.ok_or(HostError::NoHomeDir)?.join(USER_UNIT_SUBDIR),
        };

        Ok(Self {
            backend,
            privilege,
            unit_dir,
            script_dir: PathBuf::from(SYSVINIT_SCRIPT_DIR),
        })
    }

    /// Probe the running host
    pub async fn detect(probe: &Path) -> Result<Self, HostError> {
        let backend = detect_backend(probe).await;
        let user = current_username()?;
        let privilege = PrivilegeMode::from_username(&user);
        match privilege {
            PrivilegeMode::RootWide => log::info!("Running in root mode"),
            PrivilegeMode::UserSession => log::info!("Running in user mode as {}", user),
        }

        let home = dirs::home_dir();
        Self::new(backend, privilege, home.as_deref())
    }

    /// Flag addressing the per-user supervisor
    pub fn systemctl_flag(&self) -> Option<&'static str> {
        match self.privilege {
            PrivilegeMode::RootWide => None,
            PrivilegeMode::UserSession => Some("--user"),
        }
    }

    /// `systemctl` with the user flag applied when needed
    pub fn systemctl(&self) -> String {
        match self.systemctl_flag() {
            Some(flag) => format!("systemctl {}", flag),
            None => "systemctl".to_string(),
        }
    }
}
