mod cli;
mod commands;
mod error;
mod link;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use glasslink_core::DeviceSession;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;
use crate::link::{NetworkManagerJoiner, StaticLink};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a device session
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Everything else runs against a session
        cmd => {
            let session = build_session(&cli.global)?;
            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &session, &cli.global).await
        }
    }
}

/// Build a session from the config file, profile, and CLI overrides.
fn build_session(global: &GlobalOpts) -> Result<commands::Session, CliError> {
    let cfg = glasslink_config::load_config_or_default();
    let (profile_name, profile) = cfg.profile(global.profile.as_deref())?;
    let mut config = glasslink_config::profile_to_session_config(&profile, &cfg.defaults)?;

    // CLI flags win over the profile
    if let Some(ref url) = global.device_url {
        config.device_url = url.parse().map_err(|_| CliError::Validation {
            field: "device-url".into(),
            reason: format!("invalid URL: {url}"),
        })?;
    }
    if let Some(secs) = global.timeout {
        config.join_timeout = std::time::Duration::from_secs(secs);
    }

    let credentials = glasslink_config::resolve_wifi_credentials(&profile, &profile_name)?;

    Ok(DeviceSession::new(
        config,
        StaticLink::new(credentials),
        NetworkManagerJoiner::new(),
    ))
}
