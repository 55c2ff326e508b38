//! Error types for the presentation layer.

use std::path::PathBuf;

use horizon_progress_core::CoreError;

/// Result type alias for presentation operations.
pub type Result<T> = std::result::Result<T, ProgressError>;

/// Errors that can occur while building progress dialogs and popups.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// Error from the core crate, such as a headless UI context.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Configuration file could not be read.
    #[error("Failed to read progress config '{path}': {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML or has the wrong shape.
    #[error("Invalid progress config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// An icon file could not be opened or decoded.
    #[error("Failed to load icon '{path}': {source}")]
    Icon {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl ProgressError {
    /// Create a config I/O error.
    pub fn config_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source,
        }
    }

    /// Create an icon error.
    pub fn icon(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Icon {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means no display is available.
    pub fn is_headless(&self) -> bool {
        matches!(self, Self::Core(CoreError::Headless))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_converts() {
        let err: ProgressError = CoreError::Headless.into();
        assert!(err.is_headless());
        assert_eq!(err.to_string(), CoreError::Headless.to_string());
    }

    #[test]
    fn test_config_io_message_names_path() {
        let err = ProgressError::config_io(
            "/missing/progress.toml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(!err.is_headless());
        assert!(err.to_string().contains("/missing/progress.toml"));
    }
}
