use crate::error::LineCookError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 4x6 inch label at 300 DPI.
pub const TARGET_SIZE: (u32, u32) = (1200, 1800);
pub const DEFAULT_TARGET_RATIOS: (f64, f64) = (4.0 / 6.0, 6.0 / 4.0);
pub const DEFAULT_DPI: u32 = 300;
pub const MAX_FILE_SIZE: usize = 50 * 1024 * 1024;
pub const DEFAULT_MODEL_ID: &str = "shipping-label-k3hzg/4";
pub const DEFAULT_API_URL: &str = "https://serverless.roboflow.com";

/// Full application configuration, built once and passed by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LineCookConfig {
    pub pipeline: PipelineSettings,
    pub inference: InferenceSettings,
    pub printing: PrintSettings,
}

/// Which page's label wins when a document has several pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPolicy {
    /// Stop at the first page with any detection.
    #[default]
    FirstMatch,
    /// Infer every page and keep the best-scoring prediction overall.
    BestAcrossAllPages,
}

/// What happens when inference fails on one page of a multi-page scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageFailurePolicy {
    /// Abort the whole scan.
    #[default]
    FailFast,
    /// Log the failure and treat the page as having no detections.
    SkipPage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub max_file_size: usize,
    /// Extensions, matched case-insensitively with or without the leading dot.
    pub allowed_extensions: Vec<String>,
    pub dpi: u32,
    pub target_ratios: (f64, f64),
    pub scan_policy: ScanPolicy,
    pub page_failure_policy: PageFailurePolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_file_size: MAX_FILE_SIZE,
            allowed_extensions: ["pdf", "jpg", "jpeg", "png"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            dpi: DEFAULT_DPI,
            target_ratios: DEFAULT_TARGET_RATIOS,
            scan_policy: ScanPolicy::default(),
            page_failure_policy: PageFailurePolicy::default(),
        }
    }
}

impl PipelineSettings {
    /// Check an extension (with or without dot, any case) against the allow-list.
    pub fn is_allowed_extension(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.');
        self.allowed_extensions
            .iter()
            .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    pub api_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model_id: String,
    pub confidence_threshold: f64,
    pub timeout_secs: u64,
    /// Downscale pages whose longest side exceeds this before upload.
    pub max_input_side: Option<u32>,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            model_id: DEFAULT_MODEL_ID.to_string(),
            confidence_threshold: 0.04,
            timeout_secs: 30,
            max_input_side: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintSettings {
    pub enabled: bool,
    /// `auto` for the platform default, or a full command line such as `lpr -P label`.
    pub command: String,
    pub debug: bool,
    pub timeout_secs: u64,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "auto".to_string(),
            debug: false,
            timeout_secs: 30,
        }
    }
}

/// Load a configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<LineCookConfig, LineCookError> {
    let content = std::fs::read_to_string(path).map_err(|e| LineCookError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_config(&content, path)
}

/// Parse a configuration from a JSON string.
pub fn parse_config(json: &str, source: &Path) -> Result<LineCookConfig, LineCookError> {
    let config: LineCookConfig =
        serde_json::from_str(json).map_err(|e| LineCookError::ConfigLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate that a configuration is usable.
pub fn validate_config(config: &LineCookConfig) -> Result<(), LineCookError> {
    let pipeline = &config.pipeline;

    if pipeline.max_file_size == 0 {
        return Err(LineCookError::Config(
            "max_file_size must be greater than zero".into(),
        ));
    }

    if pipeline.allowed_extensions.is_empty() {
        return Err(LineCookError::Config(
            "allowed_extensions must not be empty".into(),
        ));
    }

    if pipeline.dpi == 0 {
        return Err(LineCookError::Config("dpi must be greater than zero".into()));
    }

    let (a, b) = pipeline.target_ratios;
    if !(a.is_finite() && a > 0.0 && b.is_finite() && b > 0.0) {
        return Err(LineCookError::Config(format!(
            "target ratios must be positive, got ({a}, {b})"
        )));
    }

    let inference = &config.inference;
    if !(0.0..=1.0).contains(&inference.confidence_threshold) {
        return Err(LineCookError::Config(format!(
            "confidence_threshold {} is outside [0, 1]",
            inference.confidence_threshold
        )));
    }

    if inference.model_id.trim().is_empty() {
        return Err(LineCookError::Config("model_id must not be empty".into()));
    }

    if inference.max_input_side == Some(0) {
        return Err(LineCookError::Config(
            "max_input_side must be greater than zero".into(),
        ));
    }

    if config.printing.command.trim().is_empty() {
        return Err(LineCookError::Config("print command must not be empty".into()));
    }

    Ok(())
}
