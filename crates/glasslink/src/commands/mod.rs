//! Command dispatch: bridges CLI args → session operations → output.

pub mod config_cmd;
pub mod connect;
pub mod device;
pub mod download;
pub mod status;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::link::{NetworkManagerJoiner, StaticLink};

/// The concrete session type the CLI drives.
pub type Session = glasslink_core::DeviceSession<StaticLink, NetworkManagerJoiner>;

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Status(args) => status::handle(session, args, global).await,
        Command::Connect(args) => connect::handle(session, args, global).await,
        Command::Download(args) => download::handle(session, args, global).await,
        Command::Gallery => device::gallery(session, global).await,
        Command::Mode(args) => device::mode(session, args, global).await,
        // Config is handled before dispatch
        Command::Config(_) => unreachable!(),
    }
}
