use serde::{Deserialize, Serialize};
use strum::Display;

/// Operations the device accepts over its command interface.
///
/// Closed set — the device firmware rejects anything it doesn't know, so
/// there is no catch-all variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceAction {
    /// Hardware, firmware, and WiFi firmware versions.
    GetVersion,
    /// Set the device clock to the current time.
    SetTime,
    /// Battery level and charging status.
    GetBattery,
    /// Counts of photos, videos, and audio clips on the device.
    GetMediaInfo,
    /// Trigger a photo capture.
    TakePhoto,
    /// Start or stop video recording.
    ToggleVideoRecording,
    /// Start or stop audio recording.
    ToggleAudioRecording,
    /// Trigger an AI-assisted capture.
    TakeAiImage,
    /// Put the device in capture mode (media interface unavailable).
    SwitchToCaptureMode,
    /// Put the device in transfer mode (media interface served over WiFi).
    SwitchToTransferMode,
    /// Begin serving media for bulk download.
    DownloadMedia,
    /// Show the on-device gallery.
    ViewGallery,
}
