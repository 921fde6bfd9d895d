//! Convolution engine and Harris corner response pipeline.
//!
//! Frames are planar `f64` buffers ([`emo_core::Image`]). The pipeline runs
//! Sobel gradients, Gaussian windowing of the gradient products, the Harris
//! measure and a global rescale to `[0, 1]`; the result feeds the corner
//! selector in `emo-select`.

pub mod array_ops;
pub mod builder;
pub mod config;
pub mod convolution;
pub mod error;
pub mod geometry;
pub mod kernels;
pub mod normalize;
pub mod pipeline;
pub mod tensor;

pub use array_ops::{add, multiply, power, subtract};
pub use builder::PipelineBuilder;
pub use config::PipelineConfig;
pub use convolution::{valid_convolve, valid_convolve_into, valid_output_dims};
pub use error::{HarrisError, HarrisResult};
pub use geometry::{convert_to_display, subsample, zoom_crop_rect, Rect};
pub use kernels::{KernelKind, KernelRegistry, KernelSource};
pub use normalize::{value_scale_to_unit_range, value_scale_to_unit_range_uniform};
pub use pipeline::{CornerPipeline, Stage};
pub use tensor::{harris_response, harris_response_from_products, StructureTensor};
