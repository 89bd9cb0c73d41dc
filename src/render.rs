//! Artifact rendering
//!
//! Turns a [`ServiceDescriptor`] into a systemd unit file or a SysVinit
//! script and writes it where the init system looks for it.

use std::path::{Path, PathBuf};

use crate::fs;
use crate::manager::GuardError;
use crate::units::ServiceDescriptor;

/// Mode of rendered unit files
pub const UNIT_FILE_MODE: u32 = 0o644;

/// Mode of rendered init scripts (`chmod 755`)
pub const SCRIPT_FILE_MODE: u32 = 0o755;

/// Path of the unit file for `name` inside `dir`
pub fn unit_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.service", name))
}

/// Path of the init script for `name` inside `dir`
pub fn script_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

/// Render a systemd unit file
pub fn systemd_unit(d: &ServiceDescriptor) -> String {
    format!(
        r#"[Unit]
Description={description}
ConditionPathExists={working_directory}
Wants=network-online.target
After=network-online.target

[Service]
Type=simple
WorkingDirectory={working_directory}
ExecStart={exec_start}
Restart=on-failure
RestartSec=5s
StandardOutput=syslog
StandardError=syslog
SyslogIdentifier={name}
LimitNOFILE=10000
TimeoutStopSec=20

[Install]
WantedBy=multi-user.target
"#,
        name = d.name,
        description = d.description,
        working_directory = d.working_directory.display(),
        exec_start = d.exec_start,
    )
}

/// Render a SysVinit script implementing start|stop|status|restart.
///
/// The worker is found by matching its command line against `ps -ef`, so
/// any process sharing that command line is treated as the service.
pub fn sysvinit_script(d: &ServiceDescriptor) -> String {
    format!(
        r#"#!/bin/bash
#
# Description: {description}
#
# chkconfig: 345 99 01
#
# Source function library.
# . /etc/init.d/functions

BASEDIR="{working_directory}"
SERVICE_NAME="{name}"
SERVICE_CMD='{exec_start}'

kill_process() {{
  local PROCESS_CMD=$1
  ps -ef | grep "${{PROCESS_CMD}}" | grep -v 'grep' | awk -F ' ' '{{print $2}}' | xargs -r kill -9
}}

check_process_exists() {{
  local PROCESS_CMD=$1
  local process_count=$(ps -ef | grep "${{PROCESS_CMD}}" | grep -v grep | wc -l)
  if [ $process_count -gt 0 ]; then
    return 0
  else
    return 1
  fi
}}

start() {{
  cd "$BASEDIR"
  $SERVICE_CMD >/dev/null 2>&1 &
  if check_process_exists "$SERVICE_CMD"; then
    echo "start $SERVICE_NAME ok"
    exit 0
  else
    echo "start $SERVICE_NAME failed"
    exit 1
  fi
}}

status() {{
  if check_process_exists "$SERVICE_CMD"; then
    echo "$SERVICE_NAME is running"
  else
    echo "$SERVICE_NAME is not running"
  fi
}}

stop() {{
  kill_process "$SERVICE_CMD"
  if check_process_exists "$SERVICE_CMD"; then
    echo "stop $SERVICE_NAME failed"
    exit 1
  else
    exit 0
  fi
}}

case "$1" in
  start)
    echo "Starting $SERVICE_NAME"
    start
    ;;
  status)
    echo "Status of $SERVICE_NAME"
    status
    ;;
  stop)
    echo "Stopping $SERVICE_NAME"
    stop
    ;;
  restart)
    echo "Restarting $SERVICE_NAME"
    kill_process "$SERVICE_CMD"
    start
    ;;
  *)
    echo "Usage: /etc/init.d/$SERVICE_NAME {{start|status|stop|restart}}"
    exit 1
    ;;
esac

exit 0
"#,
        name = d.name,
        description = d.description,
        working_directory = d.working_directory.display(),
        exec_start = d.exec_start,
    )
}

/// Write the unit file for `d` into `dir`. Re-rendering overwrites.
pub async fn write_systemd_unit(
    dir: &Path,
    d: &ServiceDescriptor,
) -> Result<PathBuf, GuardError> {
    let path = unit_path(dir, &d.name);
    write_artifact(&path, &systemd_unit(d), UNIT_FILE_MODE).await?;
    Ok(path)
}

/// Write the init script for `d` into `dir` and make it executable
pub async fn write_sysvinit_script(
    dir: &Path,
    d: &ServiceDescriptor,
) -> Result<PathBuf, GuardError> {
    let path = script_path(dir, &d.name);
    write_artifact(&path, &sysvinit_script(d), SCRIPT_FILE_MODE).await?;
    Ok(path)
}

async fn write_artifact(path: &Path, contents: &str, mode: u32) -> Result<(), GuardError> {
    fs::write_file(path, contents, mode)
        .await
        .map_err(|source| GuardError::Artifact {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("Wrote {}", path.display());
    Ok(())
}
