pub mod pdftoppm;

use crate::error::LineCookError;
use crate::model::{Page, SourceKind, UploadedFile};
use image::RgbImage;
use tracing::info;

/// Trait for PDF rasterization backends.
pub trait PdfRasterizer: Send + Sync {
    /// Render every page of a PDF at `dpi`, in page order.
    fn rasterize(&self, pdf_bytes: &[u8], dpi: u32) -> Result<Vec<RgbImage>, LineCookError>;

    /// Name of this rasterization backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Turn an upload into its ordered pages: one for an image, N for a PDF.
///
/// Any page that fails to render fails the whole document.
pub fn load_pages(
    upload: &UploadedFile,
    dpi: u32,
    rasterizer: &dyn PdfRasterizer,
) -> Result<Vec<Page>, LineCookError> {
    match upload.source_kind() {
        SourceKind::Pdf => {
            let images = rasterizer.rasterize(&upload.bytes, dpi)?;
            if images.is_empty() {
                return Err(LineCookError::Conversion(format!(
                    "{} contains no pages",
                    upload.filename
                )));
            }
            info!(
                backend = rasterizer.backend_name(),
                pages = images.len(),
                dpi,
                "converted PDF to images"
            );

            Ok(images
                .into_iter()
                .enumerate()
                .map(|(index, image)| Page {
                    index,
                    image,
                    description: format!("page {} of {}", index + 1, upload.filename),
                })
                .collect())
        }
        SourceKind::Image => {
            let image = decode_rgb(&upload.bytes)?;
            Ok(vec![Page {
                index: 0,
                image,
                description: upload.filename.clone(),
            }])
        }
    }
}

/// Decode image bytes into 3-channel RGB, dropping alpha and palettes.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, LineCookError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| LineCookError::Conversion(format!("failed to decode image: {e}")))?;
    Ok(image.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    struct FixedRasterizer {
        pages: usize,
    }

    impl PdfRasterizer for FixedRasterizer {
        fn rasterize(&self, _pdf_bytes: &[u8], dpi: u32) -> Result<Vec<RgbImage>, LineCookError> {
            Ok((0..self.pages)
                .map(|i| RgbImage::new(dpi / 100 + i as u32, 10))
                .collect())
        }

        fn backend_name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_pdf_pages_keep_order_and_describe_one_based() {
        let upload = UploadedFile::new("doc.pdf", b"%PDF-1.4".to_vec());
        let pages = load_pages(&upload, 300, &FixedRasterizer { pages: 3 }).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].index, 0);
        assert_eq!(pages[2].index, 2);
        assert_eq!(pages[0].width(), 3);
        assert_eq!(pages[2].width(), 5);
        assert_eq!(pages[1].description, "page 2 of doc.pdf");
    }

    #[test]
    fn test_pdf_with_no_pages_is_conversion_error() {
        let upload = UploadedFile::new("empty.pdf", b"%PDF-1.4".to_vec());
        let err = load_pages(&upload, 300, &FixedRasterizer { pages: 0 }).unwrap_err();
        assert!(matches!(err, LineCookError::Conversion(_)));
    }

    #[test]
    fn test_rgba_image_becomes_single_rgb_page() {
        let img = RgbaImage::from_pixel(5, 7, Rgba([1, 2, 3, 0]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        let upload = UploadedFile::new("label.png", buf.into_inner());

        let pages = load_pages(&upload, 300, &FixedRasterizer { pages: 9 }).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!((pages[0].width(), pages[0].height()), (5, 7));
        assert_eq!(pages[0].image.get_pixel(0, 0).0, [1, 2, 3]);
        assert_eq!(pages[0].description, "label.png");
    }

    #[test]
    fn test_undecodable_image_is_conversion_error() {
        let upload = UploadedFile::new("label.png", b"nope".to_vec());
        let err = load_pages(&upload, 300, &FixedRasterizer { pages: 1 }).unwrap_err();
        assert!(matches!(err, LineCookError::Conversion(_)));
    }
}
