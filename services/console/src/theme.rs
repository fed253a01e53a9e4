//! Dark/light theme preference

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::bail;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use common::error::ClientResult;
use common::storage::{KeyValueStore, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => bail!("Unknown theme {}", other),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Theme preference persisted under the `theme` storage key
pub struct ThemeStore {
    store: Arc<dyn KeyValueStore>,
    theme: Theme,
}

impl ThemeStore {
    /// Read the saved preference. Any saved value other than `dark` means
    /// light; with nothing saved the system preference applies.
    pub fn init(store: Arc<dyn KeyValueStore>, system_prefers_dark: bool) -> Self {
        let saved = match store.get(THEME_KEY) {
            Ok(saved) => saved.filter(|value| !value.is_empty()),
            Err(e) => {
                error!("Failed to read theme preference: {}", e);
                None
            }
        };

        let theme = match saved.as_deref() {
            Some("dark") => Theme::Dark,
            Some(_) => Theme::Light,
            None if system_prefers_dark => Theme::Dark,
            None => Theme::Light,
        };
        debug!("Theme initialized to {}", theme);

        Self { store, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn is_dark(&self) -> bool {
        self.theme == Theme::Dark
    }

    /// Flip the theme and persist it
    pub fn toggle(&mut self) -> ClientResult<Theme> {
        self.set(self.theme.toggled())?;
        Ok(self.theme)
    }

    /// Apply and persist a theme
    pub fn set(&mut self, theme: Theme) -> ClientResult<()> {
        self.store.set(THEME_KEY, theme.as_str())?;
        self.theme = theme;
        Ok(())
    }
}

impl fmt::Debug for ThemeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeStore")
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}
