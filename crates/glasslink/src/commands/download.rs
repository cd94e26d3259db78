//! Download command handler.

use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use indicatif::{ProgressBar, ProgressStyle};

use glasslink_api::MediaEntry;
use glasslink_core::{MediaSink, TransferOrchestrator};

use crate::cli::{DownloadArgs, GlobalOpts};
use crate::error::CliError;

use super::{Session, util};

/// Writes media items into a directory, advancing a progress bar.
struct FileSink {
    dir: PathBuf,
    bar: ProgressBar,
}

impl MediaSink for FileSink {
    async fn store(&self, entry: &MediaEntry, bytes: Bytes) -> io::Result<()> {
        // devices name their own files; never let a name escape the dir
        let name = std::path::Path::new(&entry.name)
            .file_name()
            .map(std::ffi::OsStr::to_owned)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "media name is not a file name"))?;

        tokio::fs::write(self.dir.join(&name), &bytes).await?;
        self.bar.inc(1);
        self.bar.set_message(entry.name.clone());
        Ok(())
    }
}

pub async fn handle(
    session: &Session,
    args: DownloadArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    tokio::fs::create_dir_all(&args.dest).await?;

    let events = util::stream_events(session, global.quiet);
    let bar = if global.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    bar.set_style(
        ProgressStyle::with_template("{spinner} {pos} downloaded  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    let orchestrator = TransferOrchestrator::new(session.clone());
    let sink = FileSink {
        dir: args.dest.clone(),
        bar: bar.clone(),
    };
    let result = orchestrator.download_media_over_wifi(&sink).await;

    bar.finish_and_clear();
    util::finish_events(events).await;
    let count = result?;

    if !global.quiet {
        println!("downloaded {count} media items to {}", args.dest.display());
    }
    Ok(())
}
