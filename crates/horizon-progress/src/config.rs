//! Progress dialog configuration.
//!
//! [`ProgressConfig`] collects the knobs a host application usually wants to
//! set once: the popup delay, window title and modality, the auto-close
//! policy, where to find the details icons, and string overrides. It can be
//! built in code or read from a TOML file:
//!
//! ```toml
//! wait_ms = 750
//! title = "Importing"
//! auto_close_on_complete = false
//! icon_dir = "/usr/share/myapp/icons"
//!
//! [strings]
//! closeButton = "Done"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use horizon_progress_core::logging::targets;

use crate::error::{ProgressError, Result};
use crate::icons::DetailsIcons;
use crate::l10n::{StringKey, Strings};

/// Default popup delay in milliseconds.
pub const DEFAULT_WAIT_MS: u64 = 500;

/// Settings shared by progress dialogs and delayed popups.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgressConfig {
    /// How long the delayed popup waits before showing the dialog.
    pub wait_ms: u64,
    /// Dialog title. `None` uses the localized default title.
    pub title: Option<String>,
    /// Whether the dialog blocks input to other windows.
    pub modal: bool,
    /// Dispose the dialog when the monitor reports completion.
    pub auto_close_on_complete: bool,
    /// Dispose the dialog after a cancellation.
    pub auto_close_on_cancel: bool,
    /// Directory holding `png/collapse.png` and `png/expand.png`.
    pub icon_dir: Option<PathBuf>,
    /// Overrides for the localized strings.
    pub strings: Strings,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            wait_ms: DEFAULT_WAIT_MS,
            title: None,
            modal: true,
            auto_close_on_complete: true,
            auto_close_on_cancel: true,
            icon_dir: None,
            strings: Strings::default(),
        }
    }
}

impl ProgressConfig {
    /// Parse a config from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::ConfigIo`] if the file cannot be read and
    /// [`ProgressError::ConfigParse`] if its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ProgressError::config_io(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(target: targets::RESOURCES, path = %path.display(), ?config, "progress config loaded");
        Ok(config)
    }

    /// The popup delay as a duration.
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    /// The configured title or the localized default.
    pub fn resolved_title(&self) -> &str {
        self.title
            .as_deref()
            .unwrap_or_else(|| self.strings.get(StringKey::DefaultDialogTitle))
    }

    /// Load the details icons from `icon_dir`, or none if it is unset.
    pub fn load_icons(&self) -> DetailsIcons {
        match &self.icon_dir {
            Some(dir) => DetailsIcons::load(dir),
            None => DetailsIcons::none(),
        }
    }

    // =========================================================================
    // Builder Pattern Methods
    // =========================================================================

    /// Set the popup delay, truncated to whole milliseconds.
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the dialog title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the modal flag.
    pub fn with_modal(mut self, modal: bool) -> Self {
        self.modal = modal;
        self
    }

    /// Set whether to dispose on completion.
    pub fn with_auto_close_on_complete(mut self, auto_close: bool) -> Self {
        self.auto_close_on_complete = auto_close;
        self
    }

    /// Set whether to dispose after a cancellation.
    pub fn with_auto_close_on_cancel(mut self, auto_close: bool) -> Self {
        self.auto_close_on_cancel = auto_close;
        self
    }

    /// Set the icon directory.
    pub fn with_icon_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.icon_dir = Some(dir.into());
        self
    }

    /// Replace the string table.
    pub fn with_strings(mut self, strings: Strings) -> Self {
        self.strings = strings;
        self
    }
}
