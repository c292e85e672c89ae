//! Service and backend configuration value objects.
//!
//! Configuration is built once at startup (from a YAML or JSON file, or in
//! code) and handed to the components that need it. Nothing here is global.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigValidator};
use super::onnx::OrtSessionConfig;

/// Name of the environment variable that overrides [`ServiceConfig::ocr_adapter`].
pub const OCR_ADAPTER_ENV: &str = "OCR_ADAPTER";

/// Channel order fed to a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Per-channel normalization `(px / 255 - mean) / std`.
///
/// `mean` and `std` are listed in `color_order`, so for BGR the first entry
/// belongs to blue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
    #[serde(default)]
    pub color_order: ColorOrder,
}

impl NormalizationConfig {
    /// ImageNet statistics in RGB order, used by the detector.
    pub fn imagenet() -> Self {
        Self {
            mean: vec![0.485, 0.456, 0.406],
            std: vec![0.229, 0.224, 0.225],
            color_order: ColorOrder::Rgb,
        }
    }

    /// Symmetric `[-1, 1]` scaling in BGR order, used by the recognizer.
    pub fn symmetric_bgr() -> Self {
        Self {
            mean: vec![0.5, 0.5, 0.5],
            std: vec![0.5, 0.5, 0.5],
            color_order: ColorOrder::Bgr,
        }
    }
}

impl ConfigValidator for NormalizationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.mean.len() != 3 || self.std.len() != 3 {
            return Err(ConfigError::invalid(format!(
                "normalization needs 3 mean and 3 std values, got {} and {}",
                self.mean.len(),
                self.std.len()
            )));
        }
        if let Some(s) = self.std.iter().find(|s| s.is_nan() || **s <= 0.0) {
            return Err(ConfigError::invalid(format!(
                "normalization std must be greater than 0, got {s}"
            )));
        }
        Ok(())
    }
}

/// Detection post-processing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Heatmap probability above which a pixel is foreground.
    pub box_threshold: f32,
    /// Regions and boxes below this area (in pixels) are dropped.
    pub min_area: f32,
    /// Unclip expansion ratio; values above 1 grow the polygon.
    pub unclip_ratio: f32,
    /// Douglas-Peucker tolerance as a fraction of the contour perimeter.
    pub poly_approx_eps: f32,
    /// Detector input geometry as `[width, height]`.
    pub target_size: [u32; 2],
    /// Smooth the heatmap with a 5x5 Gaussian before thresholding.
    pub smooth_heatmap: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            box_threshold: 0.3,
            min_area: 10.0,
            unclip_ratio: 2.5,
            poly_approx_eps: 0.002,
            target_size: [640, 640],
            smooth_heatmap: true,
        }
    }
}

impl ConfigValidator for DetectionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.require_unit_interval("box_threshold", self.box_threshold)?;
        self.require_non_negative("min_area", self.min_area)?;
        self.require_non_negative("poly_approx_eps", self.poly_approx_eps)?;
        if !self.unclip_ratio.is_finite() || self.unclip_ratio < 1.0 {
            return Err(ConfigError::invalid(format!(
                "unclip_ratio must be at least 1.0, got {}",
                self.unclip_ratio
            )));
        }
        self.require_positive_size("target_size", self.target_size[0], self.target_size[1])
    }
}

/// Recognition parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Height of every rectified crop.
    pub rec_height: u32,
    /// Crops wider than this are squeezed to it.
    pub max_width: Option<u32>,
    /// Set when the recognizer already emits probabilities.
    pub output_is_probability: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            rec_height: 48,
            max_width: None,
            output_is_probability: false,
        }
    }
}

impl ConfigValidator for RecognitionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.require_positive_size("max_width x rec_height", self.max_width.unwrap_or(1), self.rec_height)
    }
}

/// Everything the local DB + CTC backend needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaddleOcrConfig {
    pub det_model_path: PathBuf,
    pub rec_model_path: PathBuf,
    pub char_dict_path: PathBuf,
    /// Input tensor names; `x` when unset.
    #[serde(default)]
    pub det_input_name: Option<String>,
    #[serde(default)]
    pub rec_input_name: Option<String>,
    #[serde(default)]
    pub session: OrtSessionConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default = "NormalizationConfig::imagenet")]
    pub det_norm: NormalizationConfig,
    #[serde(default = "NormalizationConfig::symmetric_bgr")]
    pub rec_norm: NormalizationConfig,
    /// Process detected regions on the rayon pool.
    #[serde(default)]
    pub parallel_regions: bool,
}

impl PaddleOcrConfig {
    pub fn new(
        det_model_path: impl Into<PathBuf>,
        rec_model_path: impl Into<PathBuf>,
        char_dict_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            det_model_path: det_model_path.into(),
            rec_model_path: rec_model_path.into(),
            char_dict_path: char_dict_path.into(),
            det_input_name: None,
            rec_input_name: None,
            session: OrtSessionConfig::default(),
            detection: DetectionConfig::default(),
            recognition: RecognitionConfig::default(),
            det_norm: NormalizationConfig::imagenet(),
            rec_norm: NormalizationConfig::symmetric_bgr(),
            parallel_regions: false,
        }
    }

    /// Checks the numeric settings only, leaving file checks to [`ConfigValidator::validate`].
    pub fn validate_parameters(&self) -> Result<(), ConfigError> {
        self.session.validate()?;
        self.detection.validate()?;
        self.recognition.validate()?;
        self.det_norm.validate()?;
        self.rec_norm.validate()
    }
}

impl ConfigValidator for PaddleOcrConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.require_file(&self.det_model_path)?;
        self.require_file(&self.rec_model_path)?;
        self.require_file(&self.char_dict_path)?;
        self.validate_parameters()
    }
}

/// Remote vision-language endpoint speaking the OpenAI chat-completions protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VlmConfig {
    /// Base URL of the server, e.g. `http://localhost:1234`.
    pub base_url: String,
    /// Path appended to `base_url`.
    pub api_path: String,
    /// File holding the instruction prompt.
    pub prompt_path: PathBuf,
    pub model_name: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub min_p: f32,
    pub repeat_penalty: f32,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
    /// Strip a surrounding ```` ```json ```` fence from the model answer.
    pub strip_json_markers: bool,
    /// Extra HTTP headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for VlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234".to_string(),
            api_path: "/v1/chat/completions".to_string(),
            prompt_path: PathBuf::from("prompts/ocr_prompt.txt"),
            model_name: "gemma-3-12b-it".to_string(),
            temperature: 0.1,
            top_k: 40,
            top_p: 0.95,
            min_p: 0.05,
            repeat_penalty: 1.1,
            max_tokens: None,
            timeout_secs: 120,
            strip_json_markers: true,
            headers: BTreeMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]),
        }
    }
}

impl VlmConfig {
    /// Full request URL.
    pub fn full_api_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_path.trim_start_matches('/')
        )
    }
}

impl ConfigValidator for VlmConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::invalid("vlm base_url must not be empty"));
        }
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::invalid("vlm model_name must not be empty"));
        }
        self.require_non_negative("temperature", self.temperature)?;
        self.require_unit_interval("top_p", self.top_p)?;
        self.require_unit_interval("min_p", self.min_p)?;
        self.require_non_negative("repeat_penalty", self.repeat_penalty)
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Registry name of the backend to serve requests with.
    #[serde(default = "default_adapter")]
    pub ocr_adapter: String,
    #[serde(default)]
    pub paddleocr: Option<PaddleOcrConfig>,
    #[serde(default)]
    pub vlm: Option<VlmConfig>,
}

fn default_adapter() -> String {
    "paddleocr".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            ocr_adapter: default_adapter(),
            paddleocr: None,
            vlm: None,
        }
    }
}

impl ServiceConfig {
    /// Loads a configuration file, picking the format from its extension.
    ///
    /// `.yaml`/`.yml` files are read with `serde_yaml`, everything else with
    /// `serde_json`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let parsed = if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            message,
        })
    }

    fn from_yaml_str(content: &str) -> Result<Self, String> {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// Applies the `OCR_ADAPTER` environment override, if set.
    pub fn with_env_overrides(self) -> Self {
        let adapter = std::env::var(OCR_ADAPTER_ENV).ok();
        self.with_adapter_override(adapter)
    }

    /// Replaces the adapter name when `adapter` holds a non-empty value.
    pub fn with_adapter_override(mut self, adapter: Option<String>) -> Self {
        if let Some(name) = adapter.map(|a| a.trim().to_string())
            && !name.is_empty()
        {
            self.ocr_adapter = name;
        }
        self
    }

    /// The local backend section, or a configuration error naming it.
    pub fn paddleocr(&self) -> Result<&PaddleOcrConfig, ConfigError> {
        self.paddleocr
            .as_ref()
            .ok_or_else(|| ConfigError::invalid("missing 'paddleocr' section"))
    }

    /// The remote backend section, or a configuration error naming it.
    pub fn vlm(&self) -> Result<&VlmConfig, ConfigError> {
        self.vlm
            .as_ref()
            .ok_or_else(|| ConfigError::invalid("missing 'vlm' section"))
    }
}
