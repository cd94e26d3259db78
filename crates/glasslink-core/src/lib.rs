// glasslink-core: connection orchestration between glasslink-api and consumers.
//
// The center of this crate is `DeviceSession` — an explicit, constructible
// session object owning the connection state machine, cached credentials,
// and the status event stream. `TransferOrchestrator` sequences media
// transfer on top of it.

pub mod config;
pub mod error;
pub mod establish;
pub mod event;
pub mod negotiate;
pub mod retry;
pub mod session;
pub mod state;
pub mod transfer;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::SessionConfig;
pub use error::CoreError;
pub use event::{PreviewFrame, StatusEvent};
pub use retry::{ProbeTransport, RetryPolicy, check_with_retry};
pub use session::DeviceSession;
pub use state::ConnectionState;
pub use transfer::{MediaSink, TransferOrchestrator};
