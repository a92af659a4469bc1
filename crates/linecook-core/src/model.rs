use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Raw upload as received at the system boundary.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only its file name.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { filename, bytes })
    }

    /// Lowercase extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.filename)
    }

    pub fn source_kind(&self) -> SourceKind {
        SourceKind::from_filename(&self.filename)
    }
}

pub(crate) fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Image,
    Pdf,
}

impl SourceKind {
    pub fn from_filename(filename: &str) -> SourceKind {
        match file_extension(filename).as_deref() {
            Some("pdf") => SourceKind::Pdf,
            _ => SourceKind::Image,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Image => write!(f, "image"),
            SourceKind::Pdf => write!(f, "PDF"),
        }
    }
}

/// One rasterized unit of input: a standalone image or one PDF page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Zero-based position in the source document.
    pub index: usize,
    pub image: RgbImage,
    /// Human-readable origin, e.g. "page 2 of doc.pdf".
    pub description: String,
}

impl Page {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// A candidate label box in center coordinates, in page pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
    /// Index of the page this prediction was made on.
    #[serde(default)]
    pub page_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl Prediction {
    pub fn new(x: f64, y: f64, width: f64, height: f64, confidence: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence,
            page_index: 0,
            class: None,
        }
    }

    pub fn on_page(mut self, page_index: usize) -> Self {
        self.page_index = page_index;
        self
    }
}

/// All detections for a single page, in the order the model returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionSet {
    pub page_index: usize,
    pub predictions: Vec<Prediction>,
}

impl PredictionSet {
    pub fn new(page_index: usize, predictions: Vec<Prediction>) -> Self {
        Self {
            page_index,
            predictions,
        }
    }

    pub fn empty(page_index: usize) -> Self {
        Self::new(page_index, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }
}

/// The cropped, portrait-oriented label and where it came from.
#[derive(Debug, Clone)]
pub struct ExtractedLabel {
    pub image: RgbImage,
    pub prediction: Prediction,
    pub page_index: usize,
    pub source_description: String,
    /// True when the crop was landscape and had to be turned.
    pub rotated: bool,
}

impl ExtractedLabel {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn confidence(&self) -> f64 {
        self.prediction.confidence
    }

    /// Encode the label as PNG.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = std::io::Cursor::new(Vec::new());
        self.image.write_to(&mut buf, image::ImageFormat::Png)?;
        Ok(buf.into_inner())
    }
}

/// Terminal outcome of a page scan. Not finding a label is not an error.
#[derive(Debug, Clone)]
pub enum PipelineResult {
    Found(ExtractedLabel),
    NotFound { reason: String },
}

impl PipelineResult {
    pub fn is_found(&self) -> bool {
        matches!(self, PipelineResult::Found(_))
    }

    pub fn label(&self) -> Option<&ExtractedLabel> {
        match self {
            PipelineResult::Found(label) => Some(label),
            PipelineResult::NotFound { .. } => None,
        }
    }

    pub fn into_label(self) -> Option<ExtractedLabel> {
        match self {
            PipelineResult::Found(label) => Some(label),
            PipelineResult::NotFound { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_from_filename() {
        assert_eq!(SourceKind::from_filename("doc.PDF"), SourceKind::Pdf);
        assert_eq!(SourceKind::from_filename("scan.jpeg"), SourceKind::Image);
        assert_eq!(SourceKind::from_filename("noext"), SourceKind::Image);
    }

    #[test]
    fn test_extension_is_lowercased() {
        let upload = UploadedFile::new("Label.PNG", vec![]);
        assert_eq!(upload.extension().as_deref(), Some("png"));
        assert_eq!(UploadedFile::new("README", vec![]).extension(), None);
    }

    #[test]
    fn test_png_encoding_has_signature() {
        let label = ExtractedLabel {
            image: RgbImage::new(4, 6),
            prediction: Prediction::new(2.0, 3.0, 4.0, 6.0, 0.5),
            page_index: 0,
            source_description: "test".into(),
            rotated: false,
        };
        let png = label.to_png_bytes().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
