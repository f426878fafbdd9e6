//! # API Facade
//!
//! [`ArborApi`] is the single entry point a UI uses: it opens an outline from
//! a [`DocumentBackend`], hands out the [`Session`] for edits and filtering,
//! and writes the outline back and to backups.
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: edits live in the store and the session
//! - **Presentation**: no stdout, stderr or formatting
//!
//! ## Generic Over DocumentBackend
//!
//! `ArborApi<B: DocumentBackend>` is generic over where the document lives:
//! - Production: `ArborApi<FsBackend>`
//! - Testing: `ArborApi<MemBackend>`

use chrono::Local;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use tracing::info;

use crate::config::ArborConfig;
use crate::error::Result;
use crate::persist::{self, backup, BackupScheduler, Document};
use crate::session::Session;
use crate::store::DocumentBackend;

pub struct ArborApi<B: DocumentBackend> {
    backend: B,
    session: Session,
    backups: BackupScheduler,
    undo_capacity: usize,
    /// Store and registry revisions at the last load or save. `None` once the
    /// outline was replaced wholesale and must be written.
    saved_revision: Option<(u64, u64)>,
}

impl<B: DocumentBackend> ArborApi<B> {
    /// Loads the outline from `backend`. A missing document opens empty; a
    /// malformed one is an error.
    pub fn open(backend: B, config: &ArborConfig, backup_folder: PathBuf) -> Result<Self> {
        let (store, registry) = persist::load(&backend)?;
        let saved_revision = Some((store.revision(), registry.revision()));
        let mut backups = BackupScheduler::new(config.backup_interval_minutes, backup_folder);
        if backups.is_enabled() {
            backups.resume(store.revision());
        }
        Ok(Self {
            backend,
            session: Session::from_parts(store, registry, config.undo_capacity),
            backups,
            undo_capacity: config.undo_capacity,
            saved_revision,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn location(&self) -> PathBuf {
        self.backend.location()
    }

    fn revisions(&self) -> (u64, u64) {
        (
            self.session.store().revision(),
            self.session.registry().revision(),
        )
    }

    /// True if there are edits, to rows or references, that were not saved yet.
    pub fn is_dirty(&self) -> bool {
        self.saved_revision != Some(self.revisions())
    }

    pub fn save(&mut self) -> Result<()> {
        persist::save(&self.backend, self.session.store(), self.session.registry())?;
        self.saved_revision = Some(self.revisions());
        Ok(())
    }

    /// Saves only if something changed.
    pub fn save_if_dirty(&mut self) -> Result<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn export(&self) -> Result<Document> {
        persist::export(self.session.store(), self.session.registry())
    }

    pub fn export_json(&self) -> Result<String> {
        persist::to_json(&self.export()?)
    }

    /// Replaces the whole outline with a document in any supported version.
    /// History starts over, the filter is kept.
    pub fn import_json(&mut self, text: &str) -> Result<()> {
        let (store, registry) = persist::import(persist::from_json(text)?)?;
        let filter = self.session.filter().clone();
        info!(rows = store.len(), "outline replaced by import");
        self.session = Session::from_parts(store, registry, self.undo_capacity);
        self.session.set_filter(filter);
        self.saved_revision = None;
        self.backups.reset();
        Ok(())
    }

    /// Writes a backup now, regardless of the schedule.
    pub fn backup_now(&mut self) -> Result<PathBuf> {
        let path = backup::write_backup(&self.export()?, self.backups.folder())?;
        self.backups
            .mark_done(self.session.store().revision(), Local::now());
        Ok(path)
    }

    /// Starts a background backup if one is due. The export is taken here,
    /// so later edits do not leak into it.
    pub fn backup_if_due(&mut self) -> Result<Option<Receiver<Result<PathBuf>>>> {
        let now = Local::now();
        let revision = self.session.store().revision();
        if !self.backups.is_due(revision, now) {
            return Ok(None);
        }
        let document = self.export()?;
        self.backups.mark_done(revision, now);
        Ok(Some(backup::spawn_backup(
            document,
            self.backups.folder().to_path_buf(),
        )))
    }
}
