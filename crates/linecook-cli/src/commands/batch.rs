use image::ImageFormat;
use linecook_core::config::LineCookConfig;
use linecook_core::error::LineCookError;
use linecook_core::inference::roboflow::RoboflowClient;
use linecook_core::inference::InferenceClient;
use linecook_core::model::{PipelineResult, SourceKind, UploadedFile};
use linecook_core::pages::{self, pdftoppm::PdftoppmRasterizer, PdfRasterizer};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub fn run(input_dir: &Path, out_dir: &Path, config: &LineCookConfig) -> Result<(), LineCookError> {
    let files = collect_inputs(input_dir, config)?;
    if files.is_empty() {
        println!("No supported files found in {}", input_dir.display());
        return Ok(());
    }
    std::fs::create_dir_all(out_dir)?;

    let rasterizer = PdftoppmRasterizer::new();
    let client = RoboflowClient::new(&config.inference)?;

    let mut successful = 0;
    for path in &files {
        println!("Processing {}", path.display());
        let upload = match UploadedFile::from_path(path) {
            Ok(upload) => upload,
            Err(e) => {
                error!(path = %path.display(), "failed to read input: {e}");
                continue;
            }
        };
        if process_file(&upload, config, &rasterizer, &client, out_dir) {
            successful += 1;
        }
    }

    info!(successful, total = files.len(), "batch finished");
    println!("\n{}/{} files successful", successful, files.len());
    Ok(())
}

/// Extract and save one file's label. Failures are logged, never propagated,
/// so one bad file does not stop the batch.
fn process_file(
    upload: &UploadedFile,
    config: &LineCookConfig,
    rasterizer: &dyn PdfRasterizer,
    client: &dyn InferenceClient,
    out_dir: &Path,
) -> bool {
    match linecook_core::extract_label(upload, config, rasterizer, client) {
        Ok(PipelineResult::Found(label)) => {
            let target = out_dir.join(output_name(upload));
            if let Err(e) = label.image.save_with_format(&target, ImageFormat::Png) {
                error!(file = %upload.filename, "failed to write label: {e}");
                println!("  error: could not write {}: {e}", target.display());
                return false;
            }
            println!(
                "  label {}x{} from {} -> {}",
                label.width(),
                label.height(),
                label.source_description,
                target.display()
            );
            true
        }
        Ok(PipelineResult::NotFound { reason }) => {
            println!("  {reason}");
            if upload.source_kind() == SourceKind::Image {
                save_original(upload, out_dir);
            }
            false
        }
        Err(e) => {
            error!(file = %upload.filename, "extraction failed: {e}");
            println!("  error: {e}");
            false
        }
    }
}

/// Supported files directly inside `dir`, sorted by name.
fn collect_inputs(dir: &Path, config: &LineCookConfig) -> Result<Vec<PathBuf>, LineCookError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .map(|ext| config.pipeline.is_allowed_extension(&ext.to_string_lossy()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn file_stem(upload: &UploadedFile) -> String {
    Path::new(&upload.filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "label".to_string())
}

fn output_name(upload: &UploadedFile) -> String {
    match upload.source_kind() {
        SourceKind::Pdf => format!("{}_page.png", file_stem(upload)),
        SourceKind::Image => format!("{}.png", file_stem(upload)),
    }
}

/// Keep a PNG copy of images without a detected label, for later review.
fn save_original(upload: &UploadedFile, out_dir: &Path) {
    let target = out_dir.join(format!("no_label_{}.png", file_stem(upload)));
    let saved = pages::decode_rgb(&upload.bytes)
        .and_then(|img| Ok(img.save_with_format(&target, ImageFormat::Png)?));
    match saved {
        Ok(()) => println!("  original saved to {}", target.display()),
        Err(e) => warn!(file = %upload.filename, "could not save original: {e}"),
    }
}
