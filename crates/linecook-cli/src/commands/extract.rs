use image::ImageFormat;
use linecook_core::config::LineCookConfig;
use linecook_core::error::LineCookError;
use linecook_core::inference::roboflow::RoboflowClient;
use linecook_core::model::UploadedFile;
use linecook_core::pages::pdftoppm::PdftoppmRasterizer;
use linecook_core::report::LabelReport;
use std::path::{Path, PathBuf};

use crate::output;

pub fn run(
    input_file: &Path,
    config: &LineCookConfig,
    out: Option<PathBuf>,
    print: bool,
    output_format: &str,
    embed_image: bool,
) -> Result<(), LineCookError> {
    let upload = UploadedFile::from_path(input_file)?;
    let rasterizer = PdftoppmRasterizer::new();
    let client = RoboflowClient::new(&config.inference)?;

    let result = linecook_core::extract_label(&upload, config, &rasterizer, &client)?;
    let mut report = LabelReport::from_result(&upload.filename, &result, embed_image)?;

    if let Some(label) = result.label() {
        if let Some(path) = &out {
            label.image.save_with_format(path, ImageFormat::Png)?;
            eprintln!("Label written to {}", path.display());
        }

        if print {
            match linecook_core::print_label(label, &config.printing) {
                Ok(outcome) => report.record_print(&outcome),
                Err(e) => report.record_print_error(&e),
            }
        }
    }

    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::table::print_report(&report),
    }

    Ok(())
}
