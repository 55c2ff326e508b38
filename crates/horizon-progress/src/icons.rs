//! Icons for the dialog's details toggle.
//!
//! The toggle shows a collapse icon while the history pane is open and an
//! expand icon while it is closed. Both are read from `<dir>/png/collapse.png`
//! and `<dir>/png/expand.png`. A missing or broken file is logged and the
//! icon is left out; the toggle still works with its text label.

use std::path::{Path, PathBuf};

use horizon_progress_core::logging::targets;

use crate::error::{ProgressError, Result};

/// File name of the icon shown while the details pane is expanded.
pub const COLLAPSE_ICON: &str = "collapse.png";
/// File name of the icon shown while the details pane is collapsed.
pub const EXPAND_ICON: &str = "expand.png";

/// A decoded icon as RGBA pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct Icon {
    /// RGBA pixel data (32 bits per pixel, row-major order).
    rgba: Vec<u8>,
    width: u32,
    height: u32,
}

impl Icon {
    /// Load an icon from an image file.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::Icon`] if the file cannot be read or decoded.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| ProgressError::icon(path, e))?;
        Ok(Self::from_rgba8(img.to_rgba8()))
    }

    /// Decode an icon from in-memory image data.
    pub fn from_memory(data: &[u8]) -> Result<Self> {
        let img =
            image::load_from_memory(data).map_err(|e| ProgressError::icon("<memory>", e))?;
        Ok(Self::from_rgba8(img.to_rgba8()))
    }

    fn from_rgba8(rgba_image: image::RgbaImage) -> Self {
        let width = rgba_image.width();
        let height = rgba_image.height();
        Self {
            rgba: rgba_image.into_raw(),
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The raw RGBA pixel data.
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

impl std::fmt::Debug for Icon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Icon")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// The pair of icons used by the details toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailsIcons {
    /// Shown while the details pane is expanded.
    pub collapse: Option<Icon>,
    /// Shown while the details pane is collapsed.
    pub expand: Option<Icon>,
}

impl DetailsIcons {
    /// No icons; the toggle shows its label only.
    pub fn none() -> Self {
        Self::default()
    }

    /// Load both icons from `<dir>/png/`.
    ///
    /// Failures are logged at warn level and the affected icon is omitted.
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            collapse: load_or_warn(icon_path(dir, COLLAPSE_ICON)),
            expand: load_or_warn(icon_path(dir, EXPAND_ICON)),
        }
    }

    /// The icon for the toggle in the given state.
    pub fn for_state(&self, expanded: bool) -> Option<&Icon> {
        if expanded {
            self.collapse.as_ref()
        } else {
            self.expand.as_ref()
        }
    }
}

/// Path of a details icon below an icon directory.
pub fn icon_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join("png").join(file_name)
}

fn load_or_warn(path: PathBuf) -> Option<Icon> {
    match Icon::from_path(&path) {
        Ok(icon) => {
            tracing::debug!(target: targets::RESOURCES, path = %path.display(), "icon loaded");
            Some(icon)
        }
        Err(err) => {
            tracing::warn!(target: targets::RESOURCES, error = %err, "icon unavailable, omitting it");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_load_both_icons() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&icon_path(dir.path(), COLLAPSE_ICON), 4, 4);
        write_png(&icon_path(dir.path(), EXPAND_ICON), 8, 4);

        let icons = DetailsIcons::load(dir.path());
        let collapse = icons.collapse.as_ref().unwrap();
        assert_eq!((collapse.width(), collapse.height()), (4, 4));
        assert_eq!(collapse.rgba().len(), 4 * 4 * 4);
        assert_eq!(icons.for_state(false).unwrap().width(), 8);
    }

    #[test]
    fn test_missing_icon_is_omitted() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&icon_path(dir.path(), EXPAND_ICON), 2, 2);

        let icons = DetailsIcons::load(dir.path());
        assert!(icons.collapse.is_none());
        assert!(icons.expand.is_some());
        assert!(icons.for_state(true).is_none());
    }

    #[test]
    fn test_corrupt_icon_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = icon_path(dir.path(), COLLAPSE_ICON);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not a png").unwrap();

        let err = Icon::from_path(&path).unwrap_err();
        assert!(matches!(err, ProgressError::Icon { .. }));
        assert!(DetailsIcons::load(dir.path()).collapse.is_none());
    }

    #[test]
    fn test_from_memory_rejects_garbage() {
        assert!(Icon::from_memory(&[0, 1, 2, 3]).is_err());
    }
}
