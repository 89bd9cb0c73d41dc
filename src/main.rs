mod commands;

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use sysguard::host::{self, Backend, HostProfile};
use sysguard::{ServiceGuard, ShellRunner};

#[derive(Parser)]
#[command(name = "sysguard")]
#[command(about = "Install a worker process as a systemd or SysVinit service")]
struct Args {
    /// Force the init system instead of probing PID 1 (systemd, sysvinit)
    #[arg(long, global = true, value_parser = parse_backend)]
    backend: Option<Backend>,

    /// File holding the PID 1 command name
    #[arg(long, global = true, default_value = host::PROC1_COMM)]
    probe_file: PathBuf,

    /// Override the directory systemd unit files are written to
    #[arg(long, global = true)]
    unit_dir: Option<PathBuf>,

    /// Override the directory SysVinit scripts are written to
    #[arg(long, global = true)]
    script_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug, Default)]
pub struct DescriptorArgs {
    /// JSON descriptor file (name, description, working_directory, exec_start)
    #[arg(
        long,
        conflicts_with_all = ["name", "description", "working_directory", "exec_start"]
    )]
    pub descriptor: Option<PathBuf>,

    /// Service name, also the unit file / init script name
    #[arg(long)]
    pub name: Option<String>,

    /// Service description (defaults to the name)
    #[arg(long)]
    pub description: Option<String>,

    /// Absolute directory the worker runs from
    #[arg(long)]
    pub working_directory: Option<PathBuf>,

    /// Command line starting the worker
    #[arg(long)]
    pub exec_start: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Render, enable, start and verify a service
    Install {
        #[command(flatten)]
        descriptor: DescriptorArgs,
    },

    /// Stop, disable and remove a service
    Uninstall {
        #[command(flatten)]
        descriptor: DescriptorArgs,

        /// Also delete the service's working directory
        #[arg(long)]
        delete_working_directory: bool,
    },

    /// Print the artifact that install would write
    Render {
        #[command(flatten)]
        descriptor: DescriptorArgs,
    },

    /// Show the descriptor of an installed service
    Show {
        /// Service name
        name: String,
    },

    /// Show the detected init system and install locations
    Detect,
}

fn parse_backend(s: &str) -> Result<Backend, String> {
    Backend::parse(s)
        .ok_or_else(|| format!("unknown init system '{}' (expected systemd or sysvinit)", s))
}

/// Build the host profile once; it is fixed for the rest of the process
async fn host_profile(args: &Args) -> Result<HostProfile, Box<dyn std::error::Error>> {
    let mut profile = HostProfile::detect(&args.probe_file).await?;

    if let Some(backend) = args.backend {
        log::info!("Using {} as requested", backend);
        profile.backend = backend;
    }
    if let Some(dir) = &args.unit_dir {
        profile.unit_dir = dir.clone();
    }
    if let Some(dir) = &args.script_dir {
        profile.script_dir = dir.clone();
    }

    Ok(profile)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let args = Args::parse();
    let profile = host_profile(&args).await?;
    let guard = ServiceGuard::new(profile, ShellRunner);

    match args.command {
        Command::Install { descriptor } => {
            commands::install(&guard, &descriptor).await?;
        }
        Command::Uninstall { descriptor, delete_working_directory } => {
            commands::uninstall(&guard, &descriptor, delete_working_directory).await?;
        }
        Command::Render { descriptor } => {
            commands::render(&guard, &descriptor).await?;
        }
        Command::Show { name } => {
            commands::show(&guard, &name).await?;
        }
        Command::Detect => {
            commands::detect(&guard)?;
        }
    }

    Ok(())
}
