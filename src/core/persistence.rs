//! Durable storage for the persisted slice of the application state.
//!
//! Stores hand back `None` for anything they cannot read, whether the blob is
//! missing or corrupt, so callers always fall back to defaults instead of
//! failing startup.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use tracing::{debug, warn};

use crate::core::state::{ApplicationState, PersistedState};
use crate::utils::fs::replace_file;

/// Logical key of the persisted blob; the file store derives its file name
/// from it.
pub const STATE_KEY: &str = "neoai_state";

/// Errors raised while writing or removing the persisted blob.
#[derive(Debug)]
pub enum PersistError {
    /// The blob could not be written to or removed from disk.
    Io {
        /// Location of the blob.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The state could not be encoded as JSON.
    Encode(serde_json::Error),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Io { path, source } => {
                write!(f, "Failed to access state at {}: {}", path.display(), source)
            }
            PersistError::Encode(source) => write!(f, "Failed to encode state: {source}"),
        }
    }
}

impl StdError for PersistError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            PersistError::Io { source, .. } => Some(source),
            PersistError::Encode(source) => Some(source),
        }
    }
}

pub trait StateStore: Send + Sync {
    fn load(&self) -> Option<PersistedState>;
    fn save(&self, state: &PersistedState) -> Result<(), PersistError>;
    /// Removes the blob. Clearing an already empty store succeeds.
    fn clear(&self) -> Result<(), PersistError>;
}

/// Writes the persisted slice of `state`. Failures are logged and swallowed:
/// losing a write never interrupts the session.
pub fn persist(store: &dyn StateStore, state: &ApplicationState) {
    if let Err(err) = store.save(&state.to_persisted()) {
        warn!(error = %err, "Failed to persist application state");
    }
}

fn decode(raw: &str) -> Option<PersistedState> {
    match serde_json::from_str(raw) {
        Ok(state) => Some(state),
        Err(err) => {
            warn!(error = %err, "Discarding unreadable persisted state");
            None
        }
    }
}

/// JSON file in the platform data directory, replaced atomically on save.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn at_default_location() -> Option<Self> {
        let proj_dirs = ProjectDirs::from("org", "neoai", "neoai")?;
        Some(Self::new(
            proj_dirs.data_dir().join(format!("{STATE_KEY}.json")),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Option<PersistedState> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Failed to read persisted state");
                return None;
            }
        };
        decode(&contents)
    }

    fn save(&self, state: &PersistedState) -> Result<(), PersistError> {
        let contents = serde_json::to_string(state).map_err(PersistError::Encode)?;
        replace_file(&self.path, contents.as_bytes()).map_err(|err| self.io_error(err))?;
        debug!(path = %self.path.display(), messages = state.messages.len(), "Persisted state");
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

/// Keeps the serialized blob in memory. Used by tests and by `--ephemeral`
/// sessions that must not touch the user's saved chats.
#[derive(Default)]
pub struct MemoryStateStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with a raw blob, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Option<PersistedState> {
        self.raw().as_deref().and_then(decode)
    }

    fn save(&self, state: &PersistedState) -> Result<(), PersistError> {
        let contents = serde_json::to_string(state).map_err(PersistError::Encode)?;
        *self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(contents);
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistError> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        Ok(())
    }
}

impl<T: StateStore + ?Sized> StateStore for std::sync::Arc<T> {
    fn load(&self) -> Option<PersistedState> {
        (**self).load()
    }

    fn save(&self, state: &PersistedState) -> Result<(), PersistError> {
        (**self).save(state)
    }

    fn clear(&self) -> Result<(), PersistError> {
        (**self).clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::{Message, Role};
    use tempfile::tempdir;

    fn sample_state() -> PersistedState {
        PersistedState {
            onboarding_complete: true,
            messages: vec![
                Message::new(Role::User, "Hallo"),
                Message::new(Role::Assistant, "Hallo! Wie kann ich helfen?"),
            ],
        }
    }

    #[test]
    fn file_store_round_trips_state() {
        let dir = tempdir().expect("tempdir");
        let store = FileStateStore::new(dir.path().join("nested").join("neoai_state.json"));

        assert!(store.load().is_none());
        let state = sample_state();
        store.save(&state).expect("save");
        assert_eq!(store.load(), Some(state));
    }

    #[test]
    fn corrupt_file_reads_as_absent() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("neoai_state.json");
        fs::write(&path, "{not json").expect("write");

        let store = FileStateStore::new(path);
        assert!(store.load().is_none());
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempdir().expect("tempdir");
        let store = FileStateStore::new(dir.path().join("neoai_state.json"));
        store.save(&sample_state()).expect("save");

        store.clear().expect("first clear");
        store.clear().expect("second clear");
        assert!(store.load().is_none());
        assert!(!store.path().exists());
    }

    #[test]
    fn memory_store_treats_unknown_roles_as_corrupt() {
        let store = MemoryStateStore::with_raw(
            r#"{"onboardingComplete":true,"messages":[{"role":"robot","content":"x","timestamp":"2024-01-01T00:00:00Z"}]}"#,
        );
        assert!(store.load().is_none());
    }

    #[test]
    fn memory_store_accepts_partial_blobs() {
        let store = MemoryStateStore::with_raw(r#"{"onboardingComplete":true}"#);
        let state = store.load().expect("partial blob loads");
        assert!(state.onboarding_complete);
        assert!(state.messages.is_empty());
    }
}
