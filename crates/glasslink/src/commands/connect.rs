//! Connect command handler.

use crate::cli::{ConnectArgs, GlobalOpts};
use crate::error::CliError;

use super::{Session, util};

pub async fn handle(
    session: &Session,
    args: ConnectArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let events = util::stream_events(session, global.quiet);

    let result = match (args.ssid, args.password) {
        (Some(ssid), Some(password)) => session.connect_with(ssid, password).await,
        _ => session.connect().await,
    };

    util::finish_events(events).await;
    let url = result?;

    if !global.quiet {
        println!("connected; device at {url}");
    }
    Ok(())
}
