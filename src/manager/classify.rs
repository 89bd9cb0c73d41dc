//! Result classification for lifecycle steps
//!
//! Supervisors only report success through human-oriented text and exit
//! codes. Each [`Step`] owns the rule deciding what its command's output means.

use std::fmt;

use crate::command::CommandOutput;

/// systemctl exit status for "unit not loaded"
pub const EXIT_NOT_LOADED: i32 = 5;

/// Exit status of `systemctl is-active` / `service status` for an inactive unit
pub const EXIT_INACTIVE: i32 = 3;

/// `service` exit status for "unit could not be found"
pub const EXIT_NOT_FOUND: i32 = 4;

/// One supervisor command in a lifecycle sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    DaemonReload,
    Enable,
    Start,
    Status,
    Stop,
    IsActive,
    Disable,
    ChkconfigAdd,
    ChkconfigOn,
    ServiceStart,
    ServiceStatus,
    ServiceStop,
    ServiceStoppedStatus,
    ChkconfigOff,
    ChkconfigDel,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::DaemonReload => "systemctl daemon-reload",
            Step::Enable => "systemctl enable",
            Step::Start => "systemctl start",
            Step::Status => "systemctl status",
            Step::Stop => "systemctl stop",
            Step::IsActive => "systemctl is-active",
            Step::Disable => "systemctl disable",
            Step::ChkconfigAdd => "chkconfig --add",
            Step::ChkconfigOn => "chkconfig on",
            Step::ServiceStart => "service start",
            Step::ServiceStatus => "service status",
            Step::ServiceStop => "service stop",
            Step::ServiceStoppedStatus => "service status (stopped)",
            Step::ChkconfigOff => "chkconfig off",
            Step::ChkconfigDel => "chkconfig --del",
        }
    }

    /// Non-zero exit statuses this step accepts before looking at the output
    fn allowed_status(&self) -> &'static [i32] {
        match self {
            Step::Stop => &[EXIT_NOT_LOADED],
            Step::IsActive | Step::ServiceStoppedStatus => &[EXIT_INACTIVE],
            Step::ServiceStop => &[EXIT_NOT_FOUND],
            _ => &[],
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a command result means for the lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The unit is already in the state this step wanted to reach
    Tolerated(String),
    Failure(String),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }
}

/// Classify the output of `step` run against service `name`
pub fn classify(step: Step, name: &str, out: &CommandOutput) -> Outcome {
    match out.status {
        Some(0) => {}
        Some(code) if step.allowed_status().contains(&code) => {}
        Some(code) => return Outcome::Failure(format!("exit status {}", code)),
        None => return Outcome::Failure("terminated by signal".to_string()),
    }

    let stdout = out.stdout.as_str();
    let stderr = out.stderr.as_str();

    match step {
        Step::DaemonReload
        | Step::Start
        | Step::ChkconfigAdd
        | Step::ChkconfigOn
        | Step::ChkconfigOff
        | Step::ChkconfigDel => quiet(stdout, stderr),

        Step::Enable => {
            if !stdout.is_empty() {
                Outcome::Failure("unexpected stdout".to_string())
            } else if stderr.starts_with("Created symlink") {
                Outcome::Success
            } else if stderr.is_empty() {
                Outcome::Tolerated("already enabled".to_string())
            } else {
                Outcome::Failure("stderr does not report a created symlink".to_string())
            }
        }

        Step::Status => {
            if stdout.contains("Active: active (running)") && stderr.is_empty() {
                Outcome::Success
            } else {
                Outcome::Failure("unit is not active (running)".to_string())
            }
        }

        Step::Stop => {
            if stdout.trim().is_empty() && stderr.trim().is_empty() {
                Outcome::Success
            } else if stderr.contains("not loaded.") {
                Outcome::Tolerated("unit not loaded".to_string())
            } else {
                Outcome::Failure("unexpected output".to_string())
            }
        }

        Step::IsActive => {
            if stdout.trim() == "inactive" && stderr.is_empty() {
                Outcome::Success
            } else {
                Outcome::Failure("unit is not inactive".to_string())
            }
        }

        Step::Disable => {
            if stdout.is_empty() && (stderr.is_empty() || stderr.starts_with("Removed")) {
                Outcome::Success
            } else {
                Outcome::Failure("unexpected output".to_string())
            }
        }

        Step::ServiceStart => {
            if stdout.trim().ends_with("ok") && stderr.is_empty() {
                Outcome::Success
            } else {
                Outcome::Failure("init script did not report ok".to_string())
            }
        }

        Step::ServiceStatus => {
            let stdout = stdout.trim();
            if stdout.ends_with("running")
                && !stdout.ends_with("not running")
                && stderr.is_empty()
            {
                Outcome::Success
            } else {
                Outcome::Failure("service is not running".to_string())
            }
        }

        Step::ServiceStop => {
            if stdout.trim() == format!("Stopping {}", name) && stderr.is_empty() {
                Outcome::Success
            } else {
                Outcome::Failure("init script did not confirm stopping".to_string())
            }
        }

        Step::ServiceStoppedStatus => {
            if stdout.trim().ends_with("not running") && stderr.is_empty() {
                Outcome::Success
            } else {
                Outcome::Failure("service is still running".to_string())
            }
        }
    }
}

fn quiet(stdout: &str, stderr: &str) -> Outcome {
    if stdout.is_empty() && stderr.is_empty() {
        Outcome::Success
    } else {
        Outcome::Failure("unexpected output".to_string())
    }
}
