use crate::error::LineCookError;
use crate::model::{ExtractedLabel, Page, Prediction};
use image::{imageops, RgbImage};
use tracing::{debug, info, warn};

/// Corner form of a center-based box, still in floating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCorners {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoxCorners {
    pub fn from_center(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            left: x - width / 2.0,
            top: y - height / 2.0,
            right: x + width / 2.0,
            bottom: y + height / 2.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Clamp every corner into `[0, width] x [0, height]`. NaN clamps to 0.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        Self {
            left: self.left.max(0.0).min(w),
            top: self.top.max(0.0).min(h),
            right: self.right.max(0.0).min(w),
            bottom: self.bottom.max(0.0).min(h),
        }
    }
}

/// Pixel rectangle actually cut out of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CropRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Snap clamped corners to the pixel grid without leaving the page.
///
/// The extent is rounded first and the origin is pulled back if needed, so a
/// box inside the page always keeps `round(w) x round(h)`.
fn crop_rect(corners: &BoxCorners, page_width: u32, page_height: u32) -> CropRect {
    // Negative extents saturate to zero.
    let width = (corners.width().round() as u32).min(page_width);
    let height = (corners.height().round() as u32).min(page_height);
    let x = (corners.left.round() as u32).min(page_width - width);
    let y = (corners.top.round() as u32).min(page_height - height);
    CropRect {
        x,
        y,
        width,
        height,
    }
}

/// Cut the predicted box out of its page and force portrait orientation.
///
/// Boxes overshooting the page edge are clipped; a box with no overlap yields
/// an empty image rather than an error. Landscape crops are rotated 90 degrees
/// counter-clockwise.
pub fn extract(page: &Page, prediction: &Prediction) -> Result<ExtractedLabel, LineCookError> {
    let corners = BoxCorners::from_center(
        prediction.x,
        prediction.y,
        prediction.width,
        prediction.height,
    )
    .clamp_to(page.width(), page.height());
    let rect = crop_rect(&corners, page.width(), page.height());

    let cropped = if rect.width == 0 || rect.height == 0 {
        warn!(
            page = %page.description,
            x = prediction.x,
            y = prediction.y,
            width = prediction.width,
            height = prediction.height,
            "prediction has no overlap with the page, label is empty"
        );
        RgbImage::new(rect.width, rect.height)
    } else {
        imageops::crop_imm(&page.image, rect.x, rect.y, rect.width, rect.height).to_image()
    };

    let rotated = cropped.width() > cropped.height();
    let image = if rotated {
        debug!("rotated cropped image to portrait orientation");
        imageops::rotate270(&cropped)
    } else {
        cropped
    };

    info!(
        page = %page.description,
        width = image.width(),
        height = image.height(),
        "cropped label"
    );

    Ok(ExtractedLabel {
        image,
        prediction: prediction.clone(),
        page_index: page.index,
        source_description: page.description.clone(),
        rotated,
    })
}
