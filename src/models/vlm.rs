//! Remote vision-language backend.
//!
//! The image and an instruction prompt are sent to an OpenAI-compatible
//! chat-completions endpoint. The model is asked to answer with JSON of the
//! form `{"texts": [...], "description": "...", "sentence": "..."}`, where
//! every text carries an axis-aligned `box`.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::core::OCRError;
use crate::core::config::{ConfigValidator, VlmConfig};
use crate::core::constants::VLM_ADAPTER_NAME;
use crate::core::errors::SimpleError;
use crate::core::traits::OcrPort;
use crate::domain::{ImageDescription, OcrInput, OcrOutput, OcrResult, Rect};
use crate::processors::OrientedBox;
use crate::utils::{decode_image, encode_png};

/// Generation parameters a caller may override per request.
const GENERATION_KEYS: [&str; 7] = [
    "model",
    "temperature",
    "top_k",
    "top_p",
    "min_p",
    "repeat_penalty",
    "max_tokens",
];

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ModelAnswer {
    texts: Vec<AnswerText>,
    description: String,
    sentence: String,
}

#[derive(Debug, Deserialize)]
struct AnswerText {
    text: String,
    confidence: f32,
    #[serde(rename = "box")]
    rect: Rect,
}

/// OCR through a hosted vision-language model.
#[derive(Debug)]
pub struct VlmAdapter {
    config: VlmConfig,
    instruction: String,
    api_url: String,
    client: Client,
}

impl VlmAdapter {
    /// Reads the instruction prompt and prepares the HTTP client.
    ///
    /// # Errors
    ///
    /// Fails for invalid settings or an unreadable prompt file.
    pub fn from_config(config: &VlmConfig) -> Result<Self, OCRError> {
        let instruction = std::fs::read_to_string(&config.prompt_path).map_err(|e| {
            OCRError::model_load_error(
                &config.prompt_path,
                "failed to read instruction prompt",
                Some(e),
            )
        })?;
        Self::with_instruction(config.clone(), instruction)
    }

    /// Builds an adapter with the instruction given inline.
    pub fn with_instruction(
        config: VlmConfig,
        instruction: impl Into<String>,
    ) -> Result<Self, OCRError> {
        config.validate()?;
        let api_url = config.full_api_url();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OCRError::remote_error(&api_url, "failed to build HTTP client", Some(e)))?;

        Ok(Self {
            config,
            instruction: instruction.into(),
            api_url,
            client,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Generation parameters with `overrides` applied.
    ///
    /// # Errors
    ///
    /// Rejects override keys that are not generation parameters.
    pub fn generation_params(
        &self,
        overrides: Option<&Map<String, Value>>,
    ) -> Result<Map<String, Value>, OCRError> {
        let cfg = &self.config;
        let mut params = Map::new();
        params.insert("model".into(), json!(cfg.model_name));
        params.insert("temperature".into(), json!(cfg.temperature));
        params.insert("top_k".into(), json!(cfg.top_k));
        params.insert("top_p".into(), json!(cfg.top_p));
        params.insert("min_p".into(), json!(cfg.min_p));
        params.insert("repeat_penalty".into(), json!(cfg.repeat_penalty));
        if let Some(max_tokens) = cfg.max_tokens {
            params.insert("max_tokens".into(), json!(max_tokens));
        }

        for (key, value) in overrides.into_iter().flatten() {
            if !GENERATION_KEYS.contains(&key.as_str()) {
                return Err(OCRError::config_error(format!(
                    "Unknown hyperparameter override: {key}"
                )));
            }
            params.insert(key.clone(), value.clone());
        }
        Ok(params)
    }

    /// The chat request body: prompt plus image as a PNG data URI, followed
    /// by the generation parameters.
    pub fn build_payload(
        &self,
        png: &[u8],
        overrides: Option<&Map<String, Value>>,
    ) -> Result<Value, OCRError> {
        let data_uri = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(png)
        );
        let mut payload = Map::new();
        payload.insert(
            "messages".into(),
            json!([{
                "role": "user",
                "content": [
                    { "type": "text", "text": self.instruction },
                    { "type": "image_url", "image_url": { "url": data_uri } },
                ],
            }]),
        );
        payload.extend(self.generation_params(overrides)?);
        Ok(Value::Object(payload))
    }

    /// Like [`OcrPort::predict`], with per-call generation overrides.
    pub fn predict_with_overrides(
        &self,
        input: &OcrInput,
        overrides: Option<&Map<String, Value>>,
    ) -> Result<OcrOutput, OCRError> {
        // Re-encode so the data URI always holds what it claims to.
        let png = encode_png(&decode_image(&input.bytes)?)?;
        let payload = self.build_payload(&png, overrides)?;

        debug!("Posting {} byte image to {}", png.len(), self.api_url);
        let mut request = self.client.post(&self.api_url).json(&payload);
        for (name, value) in &self.config.headers {
            request = request.header(name, value);
        }
        let response = request
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| OCRError::remote_error(&self.api_url, "API request failed", Some(e)))?;

        let chat: ChatResponse = response.json().map_err(|e| {
            OCRError::remote_error(&self.api_url, "malformed chat completion", Some(e))
        })?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                OCRError::remote_error(
                    &self.api_url,
                    "chat completion has no choices",
                    None::<SimpleError>,
                )
            })?;

        self.parse_answer(&content)
    }

    /// Parses the model's answer into an [`OcrOutput`].
    fn parse_answer(&self, content: &str) -> Result<OcrOutput, OCRError> {
        let body = if self.config.strip_json_markers {
            strip_json_markers(content)
        } else {
            content
        };

        let answer: ModelAnswer = serde_json::from_str(body).map_err(|e| {
            warn!("Unparseable model answer: {}", content);
            OCRError::remote_error(
                &self.api_url,
                "Failed to parse model response as JSON",
                Some(e),
            )
        })?;

        let texts = answer
            .texts
            .into_iter()
            .map(|t| {
                let Rect {
                    left,
                    top,
                    right,
                    bottom,
                } = t.rect;
                OcrResult::new(t.text, t.confidence, OrientedBox::from_ltrb(left, top, right, bottom))
            })
            .collect();

        Ok(OcrOutput {
            texts,
            description: Some(ImageDescription {
                description: answer.description,
                sentence: answer.sentence,
            }),
            annotated_image: None,
        })
    }
}

impl OcrPort for VlmAdapter {
    fn name(&self) -> &str {
        VLM_ADAPTER_NAME
    }

    fn predict(&self, input: &OcrInput) -> Result<OcrOutput, OCRError> {
        self.predict_with_overrides(input, None)
    }
}

/// Removes a leading ```` ```json ```` line and a trailing ```` ``` ```` line.
fn strip_json_markers(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .map(|rest| rest.trim_start_matches(['\r', '\n']))
        .unwrap_or(text);
    text.strip_suffix("```")
        .map(|rest| rest.trim_end_matches(['\r', '\n']))
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSWER: &str = r#"{
        "texts": [
            {"text": "Hello", "confidence": 0.97, "box": {"left": 10, "top": 5, "right": 80, "bottom": 25}}
        ],
        "description": "A greeting card.",
        "sentence": "The card says hello."
    }"#;

    fn adapter(strip: bool) -> VlmAdapter {
        let config = VlmConfig {
            strip_json_markers: strip,
            ..Default::default()
        };
        VlmAdapter::with_instruction(config, "Read all text.").unwrap()
    }

    #[test]
    fn test_parse_plain_answer() {
        let output = adapter(true).parse_answer(ANSWER).unwrap();
        assert_eq!(output.texts.len(), 1);
        assert_eq!(output.texts[0].text, "Hello");
        let rect = output.texts[0].rect();
        assert_eq!(
            (rect.left, rect.top, rect.right, rect.bottom),
            (10.0, 5.0, 80.0, 25.0)
        );
        let description = output.description.unwrap();
        assert_eq!(description.sentence, "The card says hello.");
    }

    #[test]
    fn test_parse_fenced_answer() {
        let fenced = format!("```json\n{ANSWER}\n```");
        assert!(adapter(true).parse_answer(&fenced).is_ok());
        assert!(matches!(
            adapter(false).parse_answer(&fenced),
            Err(OCRError::Remote { .. })
        ));
    }

    #[test]
    fn test_strip_json_markers() {
        assert_eq!(strip_json_markers("```json\n{}\n```"), "{}");
        assert_eq!(strip_json_markers("{}"), "{}");
        assert_eq!(strip_json_markers("  ```json\r\n[1]\r\n```  "), "[1]");
    }

    #[test]
    fn test_generation_overrides() {
        let adapter = adapter(true);
        let mut overrides = Map::new();
        overrides.insert("temperature".into(), json!(0.7));
        let params = adapter.generation_params(Some(&overrides)).unwrap();
        assert_eq!(params["temperature"], json!(0.7));
        assert_eq!(params["model"], json!("gemma-3-12b-it"));
        assert!(params.get("max_tokens").is_none());

        overrides.insert("temperautre".into(), json!(0.3));
        let err = adapter.generation_params(Some(&overrides)).unwrap_err();
        assert!(err.to_string().contains("temperautre"));
    }

    #[test]
    fn test_payload_shape() {
        let payload = adapter(true).build_payload(b"\x89PNG", None).unwrap();
        let content = &payload["messages"][0]["content"];
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(content[0]["text"], "Read all text.");
        let url = content[1]["image_url"]["url"].as_str().unwrap();
        assert_eq!(url, "data:image/png;base64,iVBORw==");
        assert_eq!(payload["top_k"], json!(40));
    }

    #[test]
    fn test_unreachable_endpoint_is_a_remote_error() {
        let config = VlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let adapter = VlmAdapter::with_instruction(config, "Read.").unwrap();
        let img = image::RgbImage::new(4, 4);
        let input = OcrInput::new(encode_png(&img).unwrap());
        assert!(matches!(
            adapter.predict(&input),
            Err(OCRError::Remote { .. })
        ));
    }

    #[test]
    fn test_missing_prompt_file() {
        let config = VlmConfig {
            prompt_path: "/nonexistent/prompt.txt".into(),
            ..Default::default()
        };
        assert!(matches!(
            VlmAdapter::from_config(&config),
            Err(OCRError::ModelLoad { .. })
        ));
    }
}
