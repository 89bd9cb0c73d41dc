//! sysguard - install a worker process as an operating-system service
//!
//! Abstracts over systemd and SysVinit behind one descriptor and one set of
//! lifecycle verbs:
//! - Detects the init system and privilege mode once at startup
//! - Renders a unit file or init script from a [`ServiceDescriptor`]
//! - Drives the supervisor's own CLI and verifies every transition
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  ServiceGuard                     │
//! ├──────────────────────────────────────────────────┤
//! │  Host Profile  │  Renderer  │  Systemd / SysVinit │
//! ├──────────────────────────────────────────────────┤
//! │        Command Runner  │  Result Classifiers      │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod command;
pub mod fs;
pub mod host;
pub mod manager;
pub mod render;
pub mod units;

pub use command::{CommandOutput, CommandRunner, ShellRunner};
pub use host::{Backend, HostProfile, PrivilegeMode};
pub use manager::{GuardError, Outcome, ServiceGuard, Step};
pub use units::ServiceDescriptor;
