//! Timed snapshots of the document into a backup folder.
//!
//! The scheduler only decides *when*. The caller exports a [`Document`] (an
//! owned, point-in-time copy) and hands it to [`spawn_backup`], so the write
//! to disk never holds on to the live store.

use chrono::{DateTime, Duration, Local, NaiveDateTime};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use tracing::{info, warn};

use super::codec::to_json;
use super::document::Document;
use crate::error::Result;
use crate::store::fs_backend::write_atomic;

pub const BACKUP_PREFIX: &str = "arbor_backup_";
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Debug, Clone)]
pub struct BackupScheduler {
    interval_minutes: u32,
    folder: PathBuf,
    last_revision: Option<u64>,
    last_run: Option<DateTime<Local>>,
}

impl BackupScheduler {
    /// An interval of 0 disables backups.
    pub fn new(interval_minutes: u32, folder: impl Into<PathBuf>) -> Self {
        Self {
            interval_minutes,
            folder: folder.into(),
            last_revision: None,
            last_run: None,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn is_enabled(&self) -> bool {
        self.interval_minutes > 0
    }

    /// True if enabled, the interval has passed since the last run and the
    /// store changed since then.
    pub fn is_due(&self, revision: u64, now: DateTime<Local>) -> bool {
        if !self.is_enabled() || self.last_revision == Some(revision) {
            return false;
        }
        match self.last_run {
            None => true,
            Some(last) => now - last >= Duration::minutes(i64::from(self.interval_minutes)),
        }
    }

    /// Records a run. Call it when the backup is started, whatever its
    /// outcome: a failed attempt is not retried before the next interval.
    pub fn mark_done(&mut self, revision: u64, now: DateTime<Local>) {
        self.last_revision = Some(revision);
        self.last_run = Some(now);
    }

    /// Starts from a freshly loaded store at `revision`: nothing is due until
    /// it changes. The newest backup already in the folder counts as the last
    /// run, so the interval holds across restarts.
    pub fn resume(&mut self, revision: u64) {
        self.last_revision = Some(revision);
        self.last_run = latest_backup(&self.folder);
    }

    /// Forgets the last run, e.g. after the whole outline was replaced and
    /// revisions started over.
    pub fn reset(&mut self) {
        self.last_revision = None;
        self.last_run = None;
    }
}

/// `arbor_backup_<timestamp>.json` inside `folder`.
pub fn backup_path(folder: &Path, at: DateTime<Local>) -> PathBuf {
    folder.join(format!(
        "{BACKUP_PREFIX}{}.json",
        at.format(BACKUP_TIME_FORMAT)
    ))
}

/// Time of the newest backup in `folder`, read from the file names.
pub fn latest_backup(folder: &Path) -> Option<DateTime<Local>> {
    std::fs::read_dir(folder)
        .ok()?
        .filter_map(|entry| {
            let name = entry.ok()?.file_name().into_string().ok()?;
            let stamp = name.strip_prefix(BACKUP_PREFIX)?.strip_suffix(".json")?;
            NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT)
                .ok()?
                .and_local_timezone(Local)
                .earliest()
        })
        .max()
}

/// Writes `document` into `folder` synchronously.
pub fn write_backup(document: &Document, folder: &Path) -> Result<PathBuf> {
    let path = backup_path(folder, Local::now());
    write_atomic(&path, &to_json(document)?)?;
    info!(path = %path.display(), "backup written");
    Ok(path)
}

/// Writes `document` on a worker thread. The outcome arrives on the returned
/// channel; failures are logged there too and never touch the caller's state.
pub fn spawn_backup(document: Document, folder: PathBuf) -> Receiver<Result<PathBuf>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let outcome = write_backup(&document, &folder);
        if let Err(e) = &outcome {
            warn!(error = %e, folder = %folder.display(), "backup failed");
        }
        let _ = tx.send(outcome);
    });
    rx
}
