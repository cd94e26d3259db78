//! Status command handler.

use owo_colors::OwoColorize;

use glasslink_core::{ProbeTransport, RetryPolicy};

use crate::cli::{GlobalOpts, StatusArgs, Transport};
use crate::error::CliError;

use super::Session;

pub async fn handle(
    session: &Session,
    args: StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let transport = match args.transport {
        Transport::ShortRange => ProbeTransport::ShortRange,
        Transport::Wifi => ProbeTransport::LocalNetwork,
    };
    let policy = args.retries.map_or(session.config().status_check, |r| {
        RetryPolicy::new(r, session.config().status_check.retry_delay)
    });

    let report = session.check_status_with_retry(transport, &policy).await;

    if report.is_healthy() {
        println!("{}", "device is healthy".green());
    } else if report.is_reachable() {
        println!("{}", "device answered but is not ready".yellow());
    } else {
        println!("{}", "device is unreachable".red());
    }

    if !global.quiet {
        if let Some(config) = report.config() {
            println!("{}", String::from_utf8_lossy(config));
        }
    }

    if report.is_reachable() {
        Ok(())
    } else {
        Err(CliError::Unreachable {
            url: session.config().device_url.to_string(),
            reason: report.error_message().unwrap_or("no response").to_string(),
        })
    }
}
