// glasslink-api: transport layer for camera-glasses devices.
//
// Wraps the device-local HTTP interface behind `DeviceClient` and defines
// the narrow contracts for the two host-side primitives this stack depends
// on but does not implement: the short-range (BLE) link and the network
// join operation. `glasslink-core` builds the orchestration on top.

pub mod action;
pub mod device;
pub mod error;
pub mod link;
pub mod probe;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::DeviceAction;
pub use device::{ActionAck, DeviceClient, MediaEntry, MediaKind};
pub use error::Error;
pub use link::{NetworkJoiner, ShortRangeLink, WifiCredentials};
pub use probe::{validate_device_config, HealthReport};
pub use transport::TransportConfig;
