pub mod artifact;
pub mod config;
pub mod error;
pub mod extract;
pub mod inference;
pub mod model;
pub mod pages;
pub mod pipeline;
pub mod printing;
pub mod report;
pub mod select;
pub mod validate;

use artifact::LabelArtifact;
use config::{LineCookConfig, PrintSettings};
use error::LineCookError;
use inference::InferenceClient;
use model::{ExtractedLabel, PipelineResult, UploadedFile};
use pages::PdfRasterizer;
use printing::PrintOutcome;
use tracing::info;

/// Main API entry point: find and extract the shipping label in an upload.
///
/// Validates before touching the rasterizer or the inference backend, so a
/// rejected upload costs no I/O. Not finding a label is a normal
/// [`PipelineResult::NotFound`], not an error.
pub fn extract_label(
    upload: &UploadedFile,
    config: &LineCookConfig,
    rasterizer: &dyn PdfRasterizer,
    client: &dyn InferenceClient,
) -> Result<PipelineResult, LineCookError> {
    info!(
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        "processing uploaded file"
    );

    validate::validate(&upload.bytes, &upload.filename, &config.pipeline)?;

    let pages = pages::load_pages(upload, config.pipeline.dpi, rasterizer)?;

    pipeline::scan_pages(&pages, upload.source_kind(), &config.pipeline, client)
}

/// Write a label to a temporary PNG and send it to the printer.
///
/// The temporary file is removed before this returns.
pub fn print_label(
    label: &ExtractedLabel,
    settings: &PrintSettings,
) -> Result<PrintOutcome, LineCookError> {
    if !settings.enabled {
        return Err(LineCookError::PrintingDisabled);
    }
    let artifact = LabelArtifact::create(&label.image)?;
    printing::print_file(artifact.path(), settings)
}
