use crate::error::LineCookError;
use crate::pages::{decode_rgb, PdfRasterizer};
use image::RgbImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

const OUTPUT_PREFIX: &str = "page";

/// PDF rasterization backend using pdftoppm (from poppler-utils).
///
/// Renders each page to `page-<n>.png` inside a scratch directory that is
/// removed when rasterization returns.
pub struct PdftoppmRasterizer;

impl PdftoppmRasterizer {
    pub fn new() -> Self {
        PdftoppmRasterizer
    }

    /// Check if pdftoppm is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftoppm")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf_bytes: &[u8], dpi: u32) -> Result<Vec<RgbImage>, LineCookError> {
        let workdir = tempfile::tempdir().map_err(|e| LineCookError::Conversion(e.to_string()))?;

        let pdf_path = workdir.path().join("input.pdf");
        let mut pdf_file = std::fs::File::create(&pdf_path)
            .map_err(|e| LineCookError::Conversion(e.to_string()))?;
        pdf_file
            .write_all(pdf_bytes)
            .map_err(|e| LineCookError::Conversion(e.to_string()))?;
        drop(pdf_file);

        let output = Command::new("pdftoppm")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(&pdf_path)
            .arg(workdir.path().join(OUTPUT_PREFIX))
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    LineCookError::PdftoppmNotFound
                } else {
                    LineCookError::Conversion(format!("pdftoppm failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(LineCookError::PdftoppmFailed { code, stderr });
        }

        let page_files = list_page_files(workdir.path())?;
        debug!(pages = page_files.len(), "pdftoppm rendered pages");

        page_files
            .iter()
            .enumerate()
            .map(|(i, path)| read_page(i + 1, path))
            .collect()
    }

    fn backend_name(&self) -> &str {
        "pdftoppm"
    }
}

/// Load one rendered page; any failure is a conversion error for page `number`.
fn read_page(number: usize, path: &Path) -> Result<RgbImage, LineCookError> {
    let bytes = std::fs::read(path).map_err(|e| {
        LineCookError::Conversion(format!("page {number} could not be read: {e}"))
    })?;
    decode_rgb(&bytes).map_err(|e| {
        LineCookError::Conversion(format!("page {number} could not be decoded: {e}"))
    })
}

/// Collect `page-<n>.png` files from `dir`, ordered by page number.
///
/// pdftoppm zero-pads the number to the width of the page count, so plain
/// lexical order is not reliable across documents.
fn list_page_files(dir: &Path) -> Result<Vec<PathBuf>, LineCookError> {
    let mut numbered: Vec<(usize, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            page_number(name).map(|n| (n, path.clone()))
        })
        .collect();
    numbered.sort_by_key(|(n, _)| *n);
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

fn page_number(file_name: &str) -> Option<usize> {
    let stem = file_name.strip_suffix(".png")?;
    let digits = stem.strip_prefix(OUTPUT_PREFIX)?.strip_prefix('-')?;
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number_parsing() {
        assert_eq!(page_number("page-1.png"), Some(1));
        assert_eq!(page_number("page-007.png"), Some(7));
        assert_eq!(page_number("input.pdf"), None);
        assert_eq!(page_number("page-x.png"), None);
        assert_eq!(page_number("other-3.png"), None);
    }

    #[test]
    fn test_page_files_sorted_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-2.png", "page-1.png", "input.pdf"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let files = list_page_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["page-1.png", "page-2.png", "page-10.png"]);
    }

    #[test]
    fn test_unreadable_page_is_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_page(3, &dir.path().join("page-3.png")).unwrap_err();
        assert!(matches!(err, LineCookError::Conversion(ref m) if m.contains("page 3")));
        assert_eq!(err.category(), crate::error::ErrorCategory::BadInput);
    }

    #[test]
    fn test_undecodable_page_is_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page-1.png");
        std::fs::write(&path, b"not a png").unwrap();
        let err = read_page(1, &path).unwrap_err();
        assert!(matches!(err, LineCookError::Conversion(_)));
    }

    #[test]
    fn test_garbage_pdf_fails_conversion() {
        if !PdftoppmRasterizer::is_available() {
            return;
        }
        let err = PdftoppmRasterizer::new()
            .rasterize(b"%PDF-1.4\nnot really a pdf", 72)
            .unwrap_err();
        assert!(matches!(
            err,
            LineCookError::PdftoppmFailed { .. } | LineCookError::Conversion(_)
        ));
    }
}
