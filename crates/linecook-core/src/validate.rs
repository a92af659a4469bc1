use crate::config::PipelineSettings;
use crate::error::ValidationError;
use crate::model::file_extension;
use image::ImageFormat;
use tracing::{debug, info};

/// Check an upload's size, extension and content signature.
///
/// Pure: touches neither the filesystem nor the network, so it can run before
/// any page is loaded.
pub fn validate(
    bytes: &[u8],
    filename: &str,
    settings: &PipelineSettings,
) -> Result<(), ValidationError> {
    if bytes.len() > settings.max_file_size {
        return Err(ValidationError::TooLarge {
            size: bytes.len(),
            max: settings.max_file_size,
        });
    }

    let extension = file_extension(filename).unwrap_or_default();
    if !settings.is_allowed_extension(&extension) {
        return Err(ValidationError::UnsupportedExtension {
            extension: if extension.is_empty() {
                "(none)".to_string()
            } else {
                format!(".{extension}")
            },
            allowed: settings
                .allowed_extensions
                .iter()
                .map(|e| format!(".{}", e.trim_start_matches('.').to_lowercase()))
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    if extension == "pdf" {
        if !bytes.starts_with(b"%PDF-") {
            return Err(ValidationError::CorruptPdf);
        }
        debug!(filename, "validated PDF file");
    } else {
        let format = ImageFormat::from_extension(&extension).ok_or_else(|| {
            ValidationError::CorruptImage(format!("no decoder for '.{extension}' files"))
        })?;
        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| ValidationError::CorruptImage(e.to_string()))?;
        debug!(
            filename,
            width = image.width(),
            height = image.height(),
            "validated image file"
        );
    }

    info!(filename, "file validation passed");
    Ok(())
}
