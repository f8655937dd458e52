//! Progress persistence.
//!
//! `load` never reports "not found": a well-formed user id without a stored
//! document yields a fresh one built from [`ProgressDefaults`]. `save` is
//! atomic per call and uses the document's version as an optimistic lock, so
//! two racing completions for one user cannot silently overwrite each other.

use crate::error::{OdysseyError, Result};
use crate::progress::{validate_user_id, ProgressDefaults, UserProgress};
use nix::fcntl::{Flock, FlockArg};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub trait ProgressRepository {
    /// Stored progress, or defaults for a user seen for the first time
    fn load(&self, user_id: &str) -> Result<UserProgress>;

    /// Persist a snapshot whose version matches the stored one.
    ///
    /// The stored copy's version becomes `progress.version() + 1`.
    fn save(&self, progress: &UserProgress) -> Result<()>;

    /// Every stored document
    fn snapshots(&self) -> Result<Vec<UserProgress>>;
}

impl<R: ProgressRepository + ?Sized> ProgressRepository for &R {
    fn load(&self, user_id: &str) -> Result<UserProgress> {
        (**self).load(user_id)
    }
    fn save(&self, progress: &UserProgress) -> Result<()> {
        (**self).save(progress)
    }
    fn snapshots(&self) -> Result<Vec<UserProgress>> {
        (**self).snapshots()
    }
}

impl<R: ProgressRepository + ?Sized> ProgressRepository for Arc<R> {
    fn load(&self, user_id: &str) -> Result<UserProgress> {
        (**self).load(user_id)
    }
    fn save(&self, progress: &UserProgress) -> Result<()> {
        (**self).save(progress)
    }
    fn snapshots(&self) -> Result<Vec<UserProgress>> {
        (**self).snapshots()
    }
}

fn stale(progress: &UserProgress, found: u64) -> OdysseyError {
    warn!(
        "Stale write rejected for {}: snapshot version {}, stored version {}",
        progress.user_id(),
        progress.version(),
        found
    );
    OdysseyError::StaleWrite {
        user_id: progress.user_id().to_string(),
        expected: progress.version(),
        found,
    }
}

fn unavailable(action: &str, path: &Path, err: impl std::fmt::Display) -> OdysseyError {
    OdysseyError::RepositoryUnavailable(format!("cannot {} {}: {}", action, path.display(), err))
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| OdysseyError::RepositoryUnavailable("progress store lock poisoned".into()))
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store, used by tests and embedded callers
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    defaults: ProgressDefaults,
    documents: Mutex<HashMap<String, UserProgress>>,
}

impl InMemoryRepository {
    pub fn new(defaults: ProgressDefaults) -> Self {
        Self {
            defaults,
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// Seed a document as-is (version included), replacing any stored copy
    pub fn insert(&self, progress: UserProgress) -> Result<()> {
        lock(&self.documents)?.insert(progress.user_id().to_string(), progress);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProgressRepository for InMemoryRepository {
    fn load(&self, user_id: &str) -> Result<UserProgress> {
        validate_user_id(user_id)?;
        let mut documents = lock(&self.documents)?;
        if let Some(existing) = documents.get(user_id) {
            return Ok(existing.clone());
        }
        let created = UserProgress::new(user_id, &self.defaults)?;
        debug!("Created progress for {}", user_id);
        documents.insert(user_id.to_string(), created.clone());
        Ok(created)
    }

    fn save(&self, progress: &UserProgress) -> Result<()> {
        let mut documents = lock(&self.documents)?;
        let stored_version = documents
            .get(progress.user_id())
            .map(UserProgress::version)
            .unwrap_or(0);
        if stored_version != progress.version() {
            return Err(stale(progress, stored_version));
        }
        let mut next = progress.clone();
        next.set_version(stored_version + 1);
        documents.insert(progress.user_id().to_string(), next);
        Ok(())
    }

    fn snapshots(&self) -> Result<Vec<UserProgress>> {
        let documents = lock(&self.documents)?;
        Ok(documents.values().cloned().collect())
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// One pretty-printed `<user_id>.json` per user under a data directory.
///
/// Saves hold an exclusive `flock` on `.<user_id>.lock` for the whole
/// read-compare-write, so separate processes (or separate repository values)
/// sharing a directory serialize their writes per user.
#[derive(Debug)]
pub struct JsonFileRepository {
    dir: PathBuf,
    defaults: ProgressDefaults,
}

impl JsonFileRepository {
    pub fn new(dir: impl Into<PathBuf>, defaults: ProgressDefaults) -> Self {
        Self {
            dir: dir.into(),
            defaults,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", user_id))
    }

    /// Block until this process holds the user's write lock
    fn lock_user(&self, user_id: &str) -> Result<Flock<File>> {
        let path = self.dir.join(format!(".{}.lock", user_id));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| unavailable("open", &path, e))?;
        Flock::lock(file, FlockArg::LockExclusive)
            .map_err(|(_, errno)| unavailable("lock", &path, errno))
    }

    fn read_document(&self, user_id: &str, path: &Path) -> Result<Option<UserProgress>> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(OdysseyError::RepositoryUnavailable(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let progress: UserProgress =
            serde_json::from_str(&data).map_err(|e| OdysseyError::CorruptProgress {
                user_id: user_id.to_string(),
                reason: e.to_string(),
            })?;

        if progress.user_id() != user_id {
            return Err(OdysseyError::CorruptProgress {
                user_id: user_id.to_string(),
                reason: format!("document belongs to '{}'", progress.user_id()),
            });
        }
        progress.check_invariants()?;
        Ok(Some(progress))
    }
}

impl ProgressRepository for JsonFileRepository {
    fn load(&self, user_id: &str) -> Result<UserProgress> {
        validate_user_id(user_id)?;
        match self.read_document(user_id, &self.path_for(user_id))? {
            Some(progress) => Ok(progress),
            None => {
                debug!("No stored progress for {}, starting fresh", user_id);
                UserProgress::new(user_id, &self.defaults)
            }
        }
    }

    fn save(&self, progress: &UserProgress) -> Result<()> {
        let user_id = progress.user_id();
        validate_user_id(user_id)?;
        fs::create_dir_all(&self.dir).map_err(|e| unavailable("create", &self.dir, e))?;
        let _lock = self.lock_user(user_id)?;

        let path = self.path_for(user_id);
        let stored_version = self
            .read_document(user_id, &path)?
            .map(|p| p.version())
            .unwrap_or(0);
        if stored_version != progress.version() {
            return Err(stale(progress, stored_version));
        }

        let mut next = progress.clone();
        next.set_version(stored_version + 1);
        let data = serde_json::to_string_pretty(&next).map_err(|e| {
            OdysseyError::RepositoryUnavailable(format!("cannot serialize progress: {}", e))
        })?;

        // Unique temp name per writer, renamed over the document while locked
        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| unavailable("create temp file in", &self.dir, e))?;
        tmp.write_all(data.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| unavailable("write", tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| unavailable("replace", &path, e.error))?;

        debug!("Saved progress for {} at version {}", user_id, next.version());
        Ok(())
    }

    fn snapshots(&self) -> Result<Vec<UserProgress>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut documents = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(user_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_user_id(user_id).is_err() {
                continue;
            }
            match self.read_document(user_id, &path) {
                Ok(Some(progress)) => documents.push(progress),
                Ok(None) => {}
                // Skip unreadable documents rather than failing the whole listing
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(documents)
    }
}
