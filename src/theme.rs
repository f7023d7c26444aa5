// Persisted dark/light preference

use crate::storage::KeyValueStorage;
use eyre::{Context, Result};
use std::fmt;
use tracing::{debug, warn};

/// Storage key holding the serialized dark-mode flag
pub const DARK_MODE_KEY: &str = "darkMode";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl From<bool> for Theme {
    fn from(dark: bool) -> Self {
        if dark { Theme::Dark } else { Theme::Light }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

/// A single boolean preference, persisted on every toggle
pub struct ThemePreference<S> {
    storage: S,
    dark: bool,
}

impl<S: KeyValueStorage> ThemePreference<S> {
    /// Light mode, not yet loaded
    pub fn new(storage: S) -> Self {
        Self { storage, dark: false }
    }

    pub fn open(storage: S) -> Self {
        let mut pref = Self::new(storage);
        pref.load();
        pref
    }

    /// Read the stored flag; anything but a JSON boolean means light mode
    pub fn load(&mut self) {
        self.dark = match self.storage.get(DARK_MODE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<bool>(&raw) {
                Ok(dark) => dark,
                Err(e) => {
                    warn!(key = DARK_MODE_KEY, raw = %raw, error = ?e, "Stored theme is malformed, using light");
                    false
                }
            },
            Ok(None) => false,
            Err(e) => {
                warn!(key = DARK_MODE_KEY, error = ?e, "Failed to read stored theme, using light");
                false
            }
        };
        debug!(dark = self.dark, "Loaded theme");
    }

    /// Flip the flag and persist it, returning the new value
    pub fn toggle(&mut self) -> Result<bool> {
        let dark = !self.dark;
        let json = serde_json::to_string(&dark)?;
        self.storage
            .set(DARK_MODE_KEY, &json)
            .context("Failed to persist theme")?;

        // Only flip once storage holds the new value
        self.dark = dark;
        debug!(dark, "Toggled theme");
        Ok(dark)
    }

    pub fn current(&self) -> bool {
        self.dark
    }

    pub fn theme(&self) -> Theme {
        Theme::from(self.dark)
    }
}
