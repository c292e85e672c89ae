//! Tensor aliases shared by the pipeline stages.

/// A 2-dimensional tensor (a heatmap or a `T x C` score matrix).
pub type Tensor2D = ndarray::Array2<f32>;

/// A 3-dimensional tensor.
pub type Tensor3D = ndarray::Array3<f32>;

/// A 4-dimensional tensor (`[batch, channels, height, width]`).
pub type Tensor4D = ndarray::Array4<f32>;

/// A tensor of runtime-determined rank, as returned by an inference engine.
pub type TensorD = ndarray::ArrayD<f32>;
