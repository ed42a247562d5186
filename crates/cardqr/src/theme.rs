//! Light/dark theme preference.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::store::{KeyValueStore, THEME_KEY};

/// Display theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light background.
    #[default]
    Light,
    /// Dark background.
    Dark,
}

impl Theme {
    /// The other theme.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Read the stored theme, defaulting to light.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be read.
    pub fn load<S: KeyValueStore>(store: &S) -> Result<Self> {
        store.get(THEME_KEY, Self::default())
    }

    /// Persist this theme.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be written.
    pub fn save<S: KeyValueStore>(self, store: &S) -> Result<()> {
        debug!("Theme set to {}", self);
        store.set(THEME_KEY, &self)
    }

    /// Flip the stored theme and return the new value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be read or written.
    pub fn toggle<S: KeyValueStore>(store: &S) -> Result<Self> {
        let next = Self::load(store)?.toggled();
        next.save(store)?;
        Ok(next)
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}
