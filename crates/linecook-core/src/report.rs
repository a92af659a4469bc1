use crate::error::LineCookError;
use crate::model::PipelineResult;
use crate::printing::PrintOutcome;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDimensions {
    pub width: u32,
    pub height: u32,
}

/// Outcome of processing one upload, in the shape callers serialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelReport {
    /// Whether a label was found.
    pub success: bool,
    /// Human-readable summary, or the not-found reason.
    pub message: String,
    /// Name of the uploaded file.
    pub filename: String,
    /// Zero-based page the label came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_index: Option<usize>,
    /// Description of the page the label came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_dimensions: Option<LabelDimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// True when the crop was turned from landscape to portrait.
    #[serde(default)]
    pub rotated: bool,
    /// Base64 PNG of the label, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(default)]
    pub print_attempted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_error: Option<String>,
}

impl LabelReport {
    /// Summarize a pipeline result; embeds the PNG when `embed_image` is set.
    pub fn from_result(
        filename: &str,
        result: &PipelineResult,
        embed_image: bool,
    ) -> Result<Self, LineCookError> {
        let mut report = LabelReport {
            success: false,
            message: String::new(),
            filename: filename.to_string(),
            page_index: None,
            source: None,
            label_dimensions: None,
            confidence: None,
            rotated: false,
            image_data: None,
            print_attempted: false,
            print_success: None,
            print_message: None,
            print_error: None,
        };

        match result {
            PipelineResult::Found(label) => {
                report.success = true;
                report.message = "Label successfully detected and processed".to_string();
                report.page_index = Some(label.page_index);
                report.source = Some(label.source_description.clone());
                report.label_dimensions = Some(LabelDimensions {
                    width: label.width(),
                    height: label.height(),
                });
                report.confidence = Some(label.confidence());
                report.rotated = label.rotated;
                if embed_image {
                    report.image_data = Some(STANDARD.encode(label.to_png_bytes()?));
                }
            }
            PipelineResult::NotFound { reason } => {
                report.message = reason.clone();
            }
        }

        Ok(report)
    }

    pub fn record_print(&mut self, outcome: &PrintOutcome) {
        self.print_attempted = true;
        self.print_success = Some(outcome.success);
        self.print_message = Some(outcome.message.clone());
        if !outcome.success {
            self.print_error = Some(outcome.message.clone());
        }
    }

    pub fn record_print_error(&mut self, err: &LineCookError) {
        self.print_attempted = true;
        self.print_success = Some(false);
        self.print_message = Some(err.to_string());
        self.print_error = Some(err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExtractedLabel, Prediction};
    use image::RgbImage;

    fn found() -> PipelineResult {
        PipelineResult::Found(ExtractedLabel {
            image: RgbImage::new(12, 18),
            prediction: Prediction::new(6.0, 9.0, 12.0, 18.0, 0.87),
            page_index: 1,
            source_description: "page 2 of doc.pdf".into(),
            rotated: false,
        })
    }

    #[test]
    fn test_found_report() {
        let report = LabelReport::from_result("doc.pdf", &found(), false).unwrap();
        assert!(report.success);
        assert_eq!(report.page_index, Some(1));
        assert_eq!(
            report.label_dimensions,
            Some(LabelDimensions {
                width: 12,
                height: 18
            })
        );
        assert_eq!(report.confidence, Some(0.87));
        assert!(report.image_data.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("image_data").is_none());
        assert!(json.get("print_success").is_none());
    }

    #[test]
    fn test_embedded_image_is_base64_png() {
        let report = LabelReport::from_result("doc.pdf", &found(), true).unwrap();
        let png = STANDARD.decode(report.image_data.unwrap()).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn test_not_found_report() {
        let result = PipelineResult::NotFound {
            reason: "No shipping labels detected in image".into(),
        };
        let report = LabelReport::from_result("scan.png", &result, true).unwrap();
        assert!(!report.success);
        assert_eq!(report.message, "No shipping labels detected in image");
        assert!(report.label_dimensions.is_none());
    }

    #[test]
    fn test_failed_print_sets_error() {
        let mut report = LabelReport::from_result("doc.pdf", &found(), false).unwrap();
        report.record_print(&PrintOutcome {
            success: false,
            message: "print command failed with exit code 1".into(),
            command_used: Some("lp".into()),
        });
        assert!(report.print_attempted);
        assert_eq!(report.print_success, Some(false));
        assert!(report.print_error.is_some());
    }
}
