//! ONNX Runtime inference engine with a small session pool.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use ort::logging::LogLevel;
use ort::session::Session;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::value::TensorRef;
use tracing::debug;

use super::InferenceEngine;
use crate::core::config::{OrtGraphOptimizationLevel, OrtSessionConfig};
use crate::core::constants::DEFAULT_INPUT_NAME;
use crate::core::errors::{OCRError, SimpleError};
use crate::core::tensor::{Tensor4D, TensorD};

/// An ONNX model loaded into one or more ONNX Runtime sessions.
///
/// `Session::run` needs exclusive access, so each session sits behind a
/// mutex and calls are spread round-robin over the pool.
pub struct OrtInfer {
    sessions: Vec<Mutex<Session>>,
    next_idx: AtomicUsize,
    input_name: String,
    output_name: String,
    model_path: PathBuf,
    model_name: String,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("sessions", &self.sessions.len())
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OrtInfer {
    /// Loads a model with default runtime settings.
    pub fn new(model_path: impl AsRef<Path>, input_name: Option<&str>) -> Result<Self, OCRError> {
        Self::from_config(&OrtSessionConfig::default(), model_path, input_name)
    }

    /// Loads a model, applying the session configuration to every pooled session.
    ///
    /// # Errors
    ///
    /// Returns [`OCRError::ModelLoad`] when the file is missing or the runtime
    /// rejects it, and when the model declares no outputs.
    pub fn from_config(
        config: &OrtSessionConfig,
        model_path: impl AsRef<Path>,
        input_name: Option<&str>,
    ) -> Result<Self, OCRError> {
        let path = model_path.as_ref();
        if !path.is_file() {
            return Err(OCRError::model_load_error(
                path,
                "model file not found",
                None::<SimpleError>,
            ));
        }

        let pool_size = config.pool_size();
        let mut sessions = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let builder = Self::apply_ort_config(Session::builder()?, config)?;
            let session = builder.commit_from_file(path).map_err(|e| {
                OCRError::model_load_error(path, "failed to create ONNX session", Some(e))
            })?;
            sessions.push(Mutex::new(session));
        }

        let output_name = sessions
            .first()
            .and_then(|s| s.lock().ok())
            .and_then(|s| s.outputs.first().map(|o| o.name.clone()))
            .ok_or_else(|| {
                OCRError::model_load_error(path, "model declares no outputs", None::<SimpleError>)
            })?;

        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();

        debug!(
            "Loaded model '{}' from {} ({} session(s), output '{}')",
            model_name,
            path.display(),
            pool_size,
            output_name
        );

        Ok(OrtInfer {
            sessions,
            next_idx: AtomicUsize::new(0),
            input_name: input_name.unwrap_or(DEFAULT_INPUT_NAME).to_string(),
            output_name,
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    /// Returns the model path associated with this inference engine.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn apply_ort_config(
        mut builder: SessionBuilder,
        cfg: &OrtSessionConfig,
    ) -> Result<SessionBuilder, ort::Error> {
        builder = builder.with_log_level(LogLevel::Error)?;
        if let Some(intra) = cfg.intra_threads {
            builder = builder.with_intra_threads(intra)?;
        }
        if let Some(inter) = cfg.inter_threads {
            builder = builder.with_inter_threads(inter)?;
        }
        if let Some(par) = cfg.parallel_execution {
            builder = builder.with_parallel_execution(par)?;
        }
        if let Some(level) = cfg.optimization_level {
            let mapped = match level {
                OrtGraphOptimizationLevel::DisableAll => GraphOptimizationLevel::Disable,
                OrtGraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
                OrtGraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
                OrtGraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
            };
            builder = builder.with_optimization_level(mapped)?;
        }
        Ok(builder)
    }
}

impl InferenceEngine for OrtInfer {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn infer(&self, x: &Tensor4D) -> Result<TensorD, OCRError> {
        let input_shape = x.shape().to_vec();

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            OCRError::inference_error(
                &self.model_name,
                &format!("failed to convert input tensor with shape {input_shape:?}"),
                e,
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let idx = self.next_idx.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut session_guard = self.sessions[idx].lock().map_err(|_| {
            OCRError::inference_error(
                &self.model_name,
                &format!("session {}/{} is poisoned", idx, self.sessions.len()),
                SimpleError::new("session lock acquisition failed"),
            )
        })?;

        let outputs = session_guard.run(inputs).map_err(|e| {
            OCRError::inference_error(
                &self.model_name,
                &format!(
                    "forward pass failed for input '{}' with shape {:?}",
                    self.input_name, input_shape
                ),
                e,
            )
        })?;

        let (output_shape, output_data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                OCRError::inference_error(
                    &self.model_name,
                    &format!("failed to extract output '{}' as f32", self.output_name),
                    e,
                )
            })?;

        let dims = output_shape
            .iter()
            .map(|&d| usize::try_from(d))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                OCRError::inference_error(&self.model_name, "negative output dimension", e)
            })?;

        Ok(TensorD::from_shape_vec(dims, output_data.to_vec())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_a_load_error() {
        let err = OrtInfer::new("/nonexistent/model.onnx", None).unwrap_err();
        assert!(matches!(err, OCRError::ModelLoad { .. }));
        assert!(err.to_string().contains("model.onnx"));
    }

    #[test]
    fn test_invalid_model_file_is_a_load_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"not an onnx model").unwrap();
        let result = OrtInfer::new(file.path(), Some("x"));
        assert!(result.is_err());
    }
}
