//! Durable client-side session storage.
//!
//! Everything that must survive a restart (the bearer token, the dark-mode
//! flag) goes through the [`SessionStore`] trait so callers can swap the
//! backing medium:
//! - [`FileStore`]: one file per key in the platform-appropriate config directory:
//!   - Linux: `~/.config/storefront/`
//!   - macOS: `~/Library/Application Support/storefront/`
//!   - Windows: `%APPDATA%\storefront\`
//! - [`MemoryStore`]: process-local, for tests and ephemeral sessions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{de::DeserializeOwned, Serialize};

/// Key holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";
/// Key holding the dark-mode flag as a `true`/`false` literal.
pub const DARK_MODE_KEY: &str = "darkMode";

/// A durable key-value slot store. Writes are last-writer-wins.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Returns `true` if the value was stored.
    fn set(&self, key: &str, value: &str) -> bool;

    fn remove(&self, key: &str);
}

pub type SharedStore = Arc<dyn SessionStore>;

/// Save a value as JSON.
///
/// Returns `true` if the operation succeeded.
pub fn save<T: Serialize>(store: &dyn SessionStore, key: &str, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(json) => store.set(key, &json),
        Err(_) => false,
    }
}

/// Load a JSON value.
///
/// Returns `None` if the key doesn't exist or deserialization fails.
pub fn load<T: DeserializeOwned>(store: &dyn SessionStore, key: &str) -> Option<T> {
    let json = store.get(key)?;
    serde_json::from_str(&json).ok()
}

// =========================================
// File-backed implementation
// =========================================

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store under the platform config directory, creating it if needed.
    pub fn new() -> Option<Self> {
        let dir = dirs::config_dir()?.join("storefront");
        Self::with_dir(dir)
    }

    /// Store under an explicit directory, creating it if needed.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Option<Self> {
        let dir = dir.into();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).ok()?;
        }
        Some(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        // Keys become file names
        let safe_key = key.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        self.dir.join(safe_key)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.file_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        match std::fs::write(self.file_path(key), value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to persist session value");
                false
            }
        }
    }

    fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.file_path(key));
    }
}

// =========================================
// In-memory implementation
// =========================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        true
    }

    fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

// =========================================
// Typed accessors
// =========================================

/// The persisted bearer token, if any.
pub fn load_token(store: &dyn SessionStore) -> Option<String> {
    store.get(TOKEN_KEY).filter(|t| !t.trim().is_empty())
}

pub fn save_token(store: &dyn SessionStore, token: &str) -> bool {
    store.set(TOKEN_KEY, token)
}

pub fn clear_token(store: &dyn SessionStore) {
    store.remove(TOKEN_KEY);
}

/// User interface preferences persisted next to the session.
#[derive(Clone)]
pub struct Preferences {
    store: SharedStore,
}

impl Preferences {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn dark_mode(&self) -> bool {
        load::<bool>(self.store.as_ref(), DARK_MODE_KEY).unwrap_or(false)
    }

    pub fn set_dark_mode(&self, enabled: bool) -> bool {
        save(self.store.as_ref(), DARK_MODE_KEY, &enabled)
    }

    /// Flip the flag and return the new value.
    pub fn toggle_dark_mode(&self) -> bool {
        let enabled = !self.dark_mode();
        self.set_dark_mode(enabled);
        enabled
    }
}
