use linecook_core::config::LineCookConfig;
use linecook_core::error::LineCookError;
use linecook_core::model::{SourceKind, UploadedFile};
use linecook_core::pages::pdftoppm::PdftoppmRasterizer;
use std::path::Path;

pub fn run(input_file: &Path, config: &LineCookConfig) -> Result<(), LineCookError> {
    let upload = UploadedFile::from_path(input_file)?;
    linecook_core::validate::validate(&upload.bytes, &upload.filename, &config.pipeline)?;
    println!(
        "OK: {} ({}, {} bytes)",
        upload.filename,
        upload.source_kind(),
        upload.bytes.len()
    );
    if upload.source_kind() == SourceKind::Pdf && !PdftoppmRasterizer::is_available() {
        eprintln!("warning: pdftoppm not found; install poppler-utils to extract labels from PDFs");
    }
    Ok(())
}
