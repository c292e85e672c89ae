//! Constants used throughout the OCR service.

/// Input tensor name used when a model configuration does not name one.
pub const DEFAULT_INPUT_NAME: &str = "x";

/// Registry name of the local DB + CTC backend.
pub const PADDLE_ADAPTER_NAME: &str = "paddleocr";

/// Registry name of the remote vision-language backend.
pub const VLM_ADAPTER_NAME: &str = "vlm";

/// Normalized binomial weights of a 5-tap Gaussian with automatic sigma.
pub const GAUSSIAN_KERNEL_5: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];

/// Value written to foreground pixels of a binary mask.
pub const MASK_FOREGROUND: u8 = 255;
