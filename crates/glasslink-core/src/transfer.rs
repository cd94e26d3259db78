// ── Transfer orchestration ──
//
// Top-level sequencer: drive the session to Connected, verify the device
// is actually serving requests (a joined network does not guarantee the
// application layer is up), and only then enumerate and download media.
// Any failure before the transfer starts aborts the whole sequence.
//
// Media bytes are handed to a `MediaSink` — where they go is the
// consumer's concern, not this crate's.

use std::future::Future;

use bytes::Bytes;

use glasslink_api::{DeviceAction, MediaEntry, NetworkJoiner, ShortRangeLink};

use crate::error::CoreError;
use crate::event::PreviewFrame;
use crate::retry::ProbeTransport;
use crate::session::DeviceSession;
use crate::state::ConnectionState;

/// Receives downloaded media. Implementations decide storage.
pub trait MediaSink: Send + Sync {
    fn store(
        &self,
        entry: &MediaEntry,
        bytes: Bytes,
    ) -> impl Future<Output = std::io::Result<()>> + Send;
}

/// Sequences media transfer and device commands over a session.
pub struct TransferOrchestrator<L, J> {
    session: DeviceSession<L, J>,
}

impl<L, J> TransferOrchestrator<L, J>
where
    L: ShortRangeLink,
    J: NetworkJoiner,
{
    pub fn new(session: DeviceSession<L, J>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &DeviceSession<L, J> {
        &self.session
    }

    /// Download every media item on the device, reporting progress and
    /// preview frames through the session's status stream.
    ///
    /// Sequence: (1) reach Connected, reusing an existing connection;
    /// (2) retried health check over the local network; (3) switch the
    /// device to transfer mode, enumerate, download. Steps (1) and (2)
    /// failing abort the sequence — step (3) is never attempted.
    /// Returns the number of items downloaded.
    pub async fn download_media_over_wifi<S: MediaSink>(
        &self,
        sink: &S,
    ) -> Result<u64, CoreError> {
        // (1) connectivity
        if self.session.state() != ConnectionState::Connected {
            self.session.connect().await?;
        }

        // (2) application-layer health
        let policy = self.session.config().status_check;
        let report = self
            .session
            .check_status_with_retry(ProbeTransport::LocalNetwork, &policy)
            .await;
        if !report.is_healthy() {
            let reason = report
                .error_message()
                .unwrap_or("device is not ready to serve media")
                .to_string();
            self.session
                .mark_failed(format!("Device health check failed: {reason}"));
            return Err(CoreError::UnhealthyDevice { reason });
        }

        // (3) transfer
        let cancel = self.session.cancellation_token();
        let client = self.session.media_client()?;

        client
            .send_action(DeviceAction::SwitchToTransferMode)
            .await
            .map_err(|e| self.fail_api(e))?;

        let entries = client.list_media().await.map_err(|e| self.fail_api(e))?;
        let publisher = self.session.publisher();

        if entries.is_empty() {
            publisher.publish(ConnectionState::Connected, "No media on the device");
            return Ok(0);
        }
        publisher.publish(
            ConnectionState::Connected,
            format!("Found {} media items", entries.len()),
        );

        let mut downloaded = 0u64;
        for (idx, entry) in entries.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(CoreError::Cancelled);
            }

            let bytes = client
                .fetch_media(&entry.name)
                .await
                .map_err(|e| self.fail_api(e))?;
            let preview = client
                .thumbnail(&entry.name)
                .await
                .ok()
                .flatten()
                .map(PreviewFrame);

            sink.store(entry, bytes)
                .await
                .map_err(|e| CoreError::MediaStore {
                    name: entry.name.clone(),
                    source: e,
                })?;
            downloaded += 1;

            publisher.publish_with_preview(
                ConnectionState::Connected,
                format!("Downloaded {} ({}/{})", entry.name, idx + 1, entries.len()),
                preview,
            );
        }

        publisher.publish(
            ConnectionState::Connected,
            format!("Media download complete ({downloaded} items)"),
        );
        Ok(downloaded)
    }

    /// Show the on-device gallery. Requires Connected.
    pub async fn open_media_gallery(&self) -> Result<(), CoreError> {
        self.command(DeviceAction::ViewGallery, "Opening the media gallery")
            .await
    }

    /// Put the device back in capture mode. Requires Connected.
    pub async fn switch_to_capture_mode(&self) -> Result<(), CoreError> {
        self.command(DeviceAction::SwitchToCaptureMode, "Switched to capture mode")
            .await
    }

    /// Put the device in transfer mode. Requires Connected.
    pub async fn switch_to_transfer_mode(&self) -> Result<(), CoreError> {
        self.command(
            DeviceAction::SwitchToTransferMode,
            "Switched to transfer mode",
        )
        .await
    }

    async fn command(&self, action: DeviceAction, done: &str) -> Result<(), CoreError> {
        if self.session.state() != ConnectionState::Connected {
            return Err(CoreError::NotConnected);
        }
        let client = self.session.device_client()?;
        match client.send_action(action).await {
            Ok(_) => {
                self.session
                    .publisher()
                    .publish(ConnectionState::Connected, done);
                Ok(())
            }
            Err(e) => Err(self.fail_api(e)),
        }
    }

    /// Device-level refusals keep the connection; transport-level
    /// failures mean the device is gone and the session moves to Failed.
    fn fail_api(&self, e: glasslink_api::Error) -> CoreError {
        if e.is_unreachable() {
            self.session.mark_failed(e.to_string());
        }
        e.into()
    }
}
