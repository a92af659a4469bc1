pub mod roboflow;

use crate::error::LineCookError;
use crate::model::{Page, Prediction, PredictionSet};
use serde::Deserialize;

/// Trait for label detection backends.
///
/// Implementations make one call per page and do not retry; callers that
/// want retries wrap the client.
pub trait InferenceClient: Send + Sync {
    /// Detect label candidates on a page. An empty set means "no detections".
    fn infer(&self, page: &Page) -> Result<PredictionSet, LineCookError>;

    /// Name of this inference backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    predictions: Vec<RawPrediction>,
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    confidence: f64,
    #[serde(default)]
    class: Option<String>,
}

/// Parse a detection response body, keeping only the box and confidence.
pub fn parse_predictions(body: &str, page_index: usize) -> Result<PredictionSet, LineCookError> {
    let raw: RawResponse = serde_json::from_str(body)
        .map_err(|e| LineCookError::Inference(format!("unreadable inference response: {e}")))?;

    let predictions = raw
        .predictions
        .into_iter()
        .map(|p| Prediction {
            x: p.x,
            y: p.y,
            width: p.width,
            height: p.height,
            confidence: p.confidence,
            page_index,
            class: p.class,
        })
        .collect();

    Ok(PredictionSet::new(page_index, predictions))
}

/// Map boxes predicted on a resized upload back to page pixels.
pub fn rescale_predictions(set: &mut PredictionSet, scale_x: f64, scale_y: f64) {
    for p in &mut set.predictions {
        p.x *= scale_x;
        p.width *= scale_x;
        p.y *= scale_y;
        p.height *= scale_y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reads_box_fields_and_ignores_rest() {
        let body = r#"{
            "time": 0.12,
            "image": { "width": 2550, "height": 3300 },
            "predictions": [
                {
                    "x": 640.5, "y": 900.0, "width": 1200.0, "height": 1800.0,
                    "confidence": 0.91, "class": "label", "class_id": 0,
                    "detection_id": "0b0e9e1e"
                },
                { "x": 10, "y": 20, "width": 30, "height": 40, "confidence": 0.05 }
            ]
        }"#;
        let set = parse_predictions(body, 2).unwrap();
        assert_eq!(set.page_index, 2);
        assert_eq!(set.len(), 2);
        assert_eq!(set.predictions[0].x, 640.5);
        assert_eq!(set.predictions[0].class.as_deref(), Some("label"));
        assert_eq!(set.predictions[1].height, 40.0);
        assert_eq!(set.predictions[1].class, None);
        assert!(set.predictions.iter().all(|p| p.page_index == 2));
    }

    #[test]
    fn test_missing_predictions_is_empty_set() {
        let set = parse_predictions(r#"{ "time": 0.1 }"#, 0).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_malformed_body_is_inference_error() {
        let err = parse_predictions("<html>502</html>", 0).unwrap_err();
        assert!(matches!(err, LineCookError::Inference(_)));
    }

    #[test]
    fn test_rescale() {
        let mut set = PredictionSet::new(0, vec![Prediction::new(10.0, 20.0, 4.0, 6.0, 0.5)]);
        rescale_predictions(&mut set, 2.0, 3.0);
        let p = &set.predictions[0];
        assert_eq!((p.x, p.y, p.width, p.height), (20.0, 60.0, 8.0, 18.0));
    }
}
