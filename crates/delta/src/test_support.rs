//! In-memory [`SnapshotStore`] and environment guard used by the unit tests.

use crate::error::{DeltaError, DeltaResult};
use crate::store::{Commit, CommitRequest, SnapshotStore, StaticDeltaRequest};
use std::cell::{Cell, RefCell};
use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Serialises environment mutations and restores prior values on drop.
pub(crate) struct EnvGuard {
    entries: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            _lock: env_lock().lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    fn remember(&mut self, key: &'static str) {
        if self.entries.iter().all(|(existing, _)| *existing != key) {
            self.entries.push((key, env::var_os(key)));
        }
    }

    #[allow(unsafe_code)]
    pub(crate) fn set(&mut self, key: &'static str, value: impl AsRef<OsStr>) {
        self.remember(key);
        // SAFETY: mutations are serialised by the global lock and undone on drop.
        unsafe {
            env::set_var(key, value);
        }
    }

    #[allow(unsafe_code)]
    pub(crate) fn remove(&mut self, key: &'static str) {
        self.remember(key);
        // SAFETY: mutations are serialised by the global lock and undone on drop.
        unsafe {
            env::remove_var(key);
        }
    }
}

impl Drop for EnvGuard {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        for (key, previous) in self.entries.drain(..).rev() {
            // SAFETY: the lock is still held until this guard is gone.
            unsafe {
                match previous {
                    Some(value) => env::set_var(key, value),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

pub(crate) struct MemoryStore {
    path: PathBuf,
    id_prefix: String,
    tracks: RefCell<Vec<(String, Vec<Commit>)>>,
    pulled: RefCell<Vec<Commit>>,
    subjects: RefCell<Vec<String>>,
    minted: Cell<usize>,
    summary_updates: Cell<usize>,
    deltas: RefCell<Vec<(String, String)>>,
}

impl MemoryStore {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            id_prefix: String::from("c"),
            tracks: RefCell::new(Vec::new()),
            pulled: RefCell::new(Vec::new()),
            subjects: RefCell::new(Vec::new()),
            minted: Cell::new(0),
            summary_updates: Cell::new(0),
            deltas: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn with_id_prefix(mut self, prefix: &str) -> Self {
        self.id_prefix = prefix.to_string();
        self
    }

    /// Adds a track whose commits are given newest first.
    pub(crate) fn with_track(self, name: &str, commits: Vec<Commit>) -> Self {
        self.minted.set(self.minted.get() + commits.len());
        self.tracks.borrow_mut().push((name.to_string(), commits));
        self
    }

    pub(crate) fn pulled(&self) -> Vec<String> {
        self.pulled.borrow().iter().map(|commit| commit.id.clone()).collect()
    }

    /// Subjects passed to `commit`, oldest first.
    pub(crate) fn subjects(&self) -> Vec<String> {
        self.subjects.borrow().clone()
    }

    pub(crate) fn summary_updates(&self) -> usize {
        self.summary_updates.get()
    }

    pub(crate) fn deltas(&self) -> Vec<(String, String)> {
        self.deltas.borrow().clone()
    }

    fn find(&self, id: &str) -> Option<Commit> {
        self.tracks
            .borrow()
            .iter()
            .flat_map(|(_, commits)| commits.iter())
            .chain(self.pulled.borrow().iter())
            .find(|commit| commit.id == id)
            .cloned()
    }

    fn not_found(&self, id: &str, track: &str) -> DeltaError {
        DeltaError::IdentifierNotFound {
            id: id.to_string(),
            store: self.path.clone(),
            track: track.to_string(),
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn location(&self) -> &Path {
        &self.path
    }

    fn list_tracks(&self) -> DeltaResult<Vec<String>> {
        Ok(self.tracks.borrow().iter().map(|(name, _)| name.clone()).collect())
    }

    fn list_commits(&self, track: &str) -> DeltaResult<Vec<Commit>> {
        Ok(self
            .tracks
            .borrow()
            .iter()
            .find(|(name, _)| name == track)
            .map(|(_, commits)| commits.clone())
            .unwrap_or_default())
    }

    fn pull_local(&self, source: &Self, commit: &str) -> DeltaResult<()> {
        let found = source
            .find(commit)
            .ok_or_else(|| source.not_found(commit, "*"))?;
        self.pulled.borrow_mut().push(found);
        Ok(())
    }

    fn commit(&self, request: &CommitRequest<'_>) -> DeltaResult<String> {
        if self.find(request.tree_ref).is_none() {
            return Err(self.not_found(request.tree_ref, request.track));
        }

        self.minted.set(self.minted.get() + 1);
        let id = format!("{}{}", self.id_prefix, self.minted.get());
        let mut commit = Commit::new(&id)
            .with_metadata("Version", request.version)
            .with_metadata("Tree", request.tree_ref);
        if let Some(timestamp) = request.timestamp {
            commit = commit.with_metadata("Date", timestamp);
        }
        self.subjects.borrow_mut().push(request.subject.to_string());

        let mut tracks = self.tracks.borrow_mut();
        match tracks.iter_mut().find(|(name, _)| name == request.track) {
            Some((_, commits)) => commits.insert(0, commit),
            None => tracks.push((request.track.to_string(), vec![commit])),
        }
        Ok(id)
    }

    fn update_summary(&self) -> DeltaResult<()> {
        self.summary_updates.set(self.summary_updates.get() + 1);
        Ok(())
    }

    fn generate_static_delta(&self, request: &StaticDeltaRequest<'_>) -> DeltaResult<()> {
        let ids: Vec<String> = self
            .list_commits(request.track)?
            .into_iter()
            .map(|commit| commit.id)
            .collect();
        for id in [request.from, request.to] {
            if !ids.iter().any(|candidate| candidate == id) {
                return Err(self.not_found(id, request.track));
            }
        }

        fs::write(request.filename, format!("{}->{}", request.from, request.to))
            .map_err(|error| DeltaError::io("failed to write superblock", error))?;
        self.deltas
            .borrow_mut()
            .push((request.from.to_string(), request.to.to_string()));
        Ok(())
    }
}
