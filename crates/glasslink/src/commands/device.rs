//! Gallery and mode-switch command handlers.

use glasslink_core::{ConnectionState, TransferOrchestrator};

use crate::cli::{GlobalOpts, ModeArgs, ModeCommand};
use crate::error::CliError;

use super::{Session, util};

/// Device commands require Connected, and session state does not outlive
/// the process — so drive the connection here instead of referring the
/// user to a previous invocation.
async fn ensure_connected(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    if session.state() == ConnectionState::Connected {
        return Ok(());
    }
    let events = util::stream_events(session, global.quiet);
    let result = session.connect().await;
    util::finish_events(events).await;
    result?;
    Ok(())
}

pub async fn gallery(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    ensure_connected(session, global).await?;
    let orchestrator = TransferOrchestrator::new(session.clone());
    orchestrator.open_media_gallery().await?;
    if !global.quiet {
        eprintln!("gallery opened on the device");
    }
    Ok(())
}

pub async fn mode(session: &Session, args: ModeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    ensure_connected(session, global).await?;
    let orchestrator = TransferOrchestrator::new(session.clone());
    let done = match args.command {
        ModeCommand::Capture => {
            orchestrator.switch_to_capture_mode().await?;
            "device is in capture mode"
        }
        ModeCommand::Transfer => {
            orchestrator.switch_to_transfer_mode().await?;
            "device is in transfer mode"
        }
    };
    if !global.quiet {
        eprintln!("{done}");
    }
    Ok(())
}
