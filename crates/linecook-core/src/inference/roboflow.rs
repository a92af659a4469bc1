use crate::config::InferenceSettings;
use crate::error::LineCookError;
use crate::inference::{parse_predictions, rescale_predictions, InferenceClient};
use crate::model::{Page, PredictionSet};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info};

/// Hosted Roboflow detection endpoint.
///
/// Pages are sent as base64 JPEG in a form-encoded body; the API key and the
/// confidence threshold travel as query parameters.
pub struct RoboflowClient {
    client: Client,
    endpoint: String,
    api_key: String,
    confidence_threshold: f64,
    max_input_side: Option<u32>,
}

impl RoboflowClient {
    pub fn new(settings: &InferenceSettings) -> Result<Self, LineCookError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LineCookError::Config(
                    "ROBOFLOW_API_KEY is not configured. Set it in the environment or the config file"
                        .into(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| LineCookError::Config(format!("failed to build HTTP client: {e}")))?;

        let endpoint = format!(
            "{}/{}",
            settings.api_url.trim_end_matches('/'),
            settings.model_id.trim_matches('/')
        );
        info!(model = %settings.model_id, "initialized inference client");

        Ok(Self {
            client,
            endpoint,
            api_key,
            confidence_threshold: settings.confidence_threshold,
            max_input_side: settings.max_input_side,
        })
    }

    /// Encode the page, downscaling first if it exceeds `max_input_side`.
    ///
    /// Returns the base64 payload and the dimensions actually sent.
    fn encode_page(&self, page: &Page) -> Result<(String, u32, u32), LineCookError> {
        let mut image = DynamicImage::ImageRgb8(page.image.clone());
        if let Some(max_side) = self.max_input_side {
            if page.width().max(page.height()) > max_side {
                image = image.resize(max_side, max_side, FilterType::Triangle);
                debug!(
                    from_width = page.width(),
                    from_height = page.height(),
                    to_width = image.width(),
                    to_height = image.height(),
                    "downscaled page before upload"
                );
            }
        }

        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageFormat::Jpeg)?;
        Ok((STANDARD.encode(buf.into_inner()), image.width(), image.height()))
    }
}

impl InferenceClient for RoboflowClient {
    fn infer(&self, page: &Page) -> Result<PredictionSet, LineCookError> {
        let (payload, sent_width, sent_height) = self.encode_page(page)?;
        let confidence = self.confidence_threshold.to_string();

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("confidence", confidence.as_str()),
            ])
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(payload)
            .send()
            // The URL carries the API key; keep it out of error messages.
            .map_err(|e| {
                if e.is_timeout() {
                    LineCookError::Inference("request timed out".into())
                } else {
                    LineCookError::Inference(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| LineCookError::Inference(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(LineCookError::InferenceStatus {
                status: status.as_u16(),
                body,
            });
        }

        let mut set = parse_predictions(&body, page.index)?;
        if (sent_width, sent_height) != (page.width(), page.height()) {
            rescale_predictions(
                &mut set,
                page.width() as f64 / sent_width as f64,
                page.height() as f64 / sent_height as f64,
            );
        }

        info!(
            page = %page.description,
            predictions = set.len(),
            "inference completed"
        );
        Ok(set)
    }

    fn backend_name(&self) -> &str {
        "roboflow"
    }
}
