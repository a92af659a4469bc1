use crate::error::LineCookError;
use image::RgbImage;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// A label written to a temporary PNG for hand-off to other processes.
///
/// The file is deleted when the artifact is dropped, whichever way the caller
/// exits.
pub struct LabelArtifact {
    file: NamedTempFile,
}

impl LabelArtifact {
    /// Write `image` as PNG into the system temp directory.
    pub fn create(image: &RgbImage) -> Result<Self, LineCookError> {
        let file = tempfile::Builder::new()
            .prefix("linecook-")
            .suffix(".png")
            .tempfile()?;
        Self::write(file, image)
    }

    /// Write `image` as PNG into `dir`.
    pub fn create_in(dir: &Path, image: &RgbImage) -> Result<Self, LineCookError> {
        std::fs::create_dir_all(dir)?;
        let file = tempfile::Builder::new()
            .prefix("linecook-")
            .suffix(".png")
            .tempfile_in(dir)?;
        Self::write(file, image)
    }

    fn write(file: NamedTempFile, image: &RgbImage) -> Result<Self, LineCookError> {
        image.save_with_format(file.path(), image::ImageFormat::Png)?;
        debug!(path = %file.path().display(), "wrote label artifact");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
