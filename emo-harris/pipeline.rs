use std::time::Instant;

use emo_core::Image;
use log::{debug, info, warn};

use crate::array_ops::multiply_into;
use crate::config::PipelineConfig;
use crate::convolution::valid_convolve_into;
use crate::error::{HarrisError, HarrisResult};
use crate::geometry::{convert_to_display_into, DISPLAY_PADDING};
use crate::kernels::{KernelKind, KernelRegistry, KernelSource};
use crate::normalize::value_scale_to_unit_range_uniform;
use crate::tensor::StructureTensor;

/// One step of a detection pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Optional input pre-smoothing, Sobel gradients and their products.
    Gradient,
    /// Gaussian window over the gradient products.
    Smoothing,
    /// Structure tensor and Harris response.
    Response,
    /// Global rescale to [0, 1] and display conversion.
    Normalize,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Gradient, Stage::Smoothing, Stage::Response, Stage::Normalize];

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Gradient => Some(Stage::Smoothing),
            Stage::Smoothing => Some(Stage::Response),
            Stage::Response => Some(Stage::Normalize),
            Stage::Normalize => None,
        }
    }
}

/// Harris corner response pipeline for frames of one fixed shape.
///
/// All intermediate buffers are sized once at construction and reused by
/// every pass. A pass runs either in one call ([`run`](Self::run)) or
/// stage by stage via [`begin`](Self::begin) and [`step`](Self::step).
pub struct CornerPipeline<S: KernelSource = &'static KernelRegistry> {
    kernels: S,
    config: PipelineConfig,
    kappa: f64,
    offset: (usize, usize),

    input: Image,
    pre_smoothed: Option<(KernelKind, Image)>,
    ix: Image,
    iy: Image,
    ixx: Image,
    iyy: Image,
    ixy: Image,
    sxx: Image,
    syy: Image,
    sxy: Image,
    tensor: StructureTensor,
    response: Image,
    display: Vec<[u8; 4]>,

    next_stage: Option<Stage>,
}

impl CornerPipeline {
    /// Creates a pipeline backed by the process-wide kernel registry
    pub fn new(config: PipelineConfig) -> HarrisResult<Self> {
        Self::with_kernels(config, KernelRegistry::global())
    }
}

impl<S: KernelSource> CornerPipeline<S> {
    /// Creates a pipeline with validation, sizing every buffer from the
    /// frame dimensions and the kernels `kernels` hands out
    pub fn with_kernels(config: PipelineConfig, kernels: S) -> HarrisResult<Self> {
        config.validate()?;

        let sobel_x = kernels.kernel(KernelKind::SobelX);
        let sobel_y = kernels.kernel(KernelKind::SobelY);
        if (sobel_x.rows(), sobel_x.cols()) != (sobel_y.rows(), sobel_y.cols()) {
            return Err(HarrisError::GradientKernelMismatch {
                x_rows: sobel_x.rows(),
                x_cols: sobel_x.cols(),
                y_rows: sobel_y.rows(),
                y_cols: sobel_y.cols(),
            });
        }
        let smooth = kernels.kernel(config.smoothing);
        let (pre_rows, pre_cols) = config
            .pre_smoothing
            .map_or((1, 1), |kind| {
                let k = kernels.kernel(kind);
                (k.rows(), k.cols())
            });

        let min_width = pre_cols + sobel_x.cols() + smooth.cols() - 2;
        let min_height = pre_rows + sobel_x.rows() + smooth.rows() - 2;
        if config.width < min_width || config.height < min_height {
            return Err(HarrisError::ImageTooSmall {
                width: config.width,
                height: config.height,
                min_width,
                min_height,
            });
        }

        let pre_w = config.width - pre_cols + 1;
        let pre_h = config.height - pre_rows + 1;
        let grad_w = pre_w - sobel_x.cols() + 1;
        let grad_h = pre_h - sobel_x.rows() + 1;
        let resp_w = grad_w - smooth.cols() + 1;
        let resp_h = grad_h - smooth.rows() + 1;

        if config.display_width < resp_w || config.display_height < resp_h {
            return Err(HarrisError::DisplayTooSmall {
                display_width: config.display_width,
                display_height: config.display_height,
                response_width: resp_w,
                response_height: resp_h,
            });
        }

        let kappa = config.clamped_kappa();
        if kappa != config.kappa {
            warn!("kappa {} outside [0.04, 0.15], clamped to {}", config.kappa, kappa);
        }

        let offset = (
            (pre_rows - 1) / 2 + (sobel_x.rows() - 1) / 2 + (smooth.rows() - 1) / 2,
            (pre_cols - 1) / 2 + (sobel_x.cols() - 1) / 2 + (smooth.cols() - 1) / 2,
        );

        let ch = config.channels;
        let grad = || Image::new(grad_w, grad_h, ch);
        let resp = || Image::new(resp_w, resp_h, ch);

        info!(
            "Corner pipeline {}x{}x{} -> response {}x{} ({:?}, kappa {:.3})",
            config.width, config.height, ch, resp_w, resp_h, config.smoothing, kappa
        );

        Ok(Self {
            input: Image::new(config.width, config.height, ch),
            pre_smoothed: config.pre_smoothing.map(|kind| (kind, Image::new(pre_w, pre_h, ch))),
            ix: grad(),
            iy: grad(),
            ixx: grad(),
            iyy: grad(),
            ixy: grad(),
            sxx: resp(),
            syy: resp(),
            sxy: resp(),
            tensor: StructureTensor::new(resp_w, resp_h, ch),
            response: resp(),
            display: vec![DISPLAY_PADDING; config.display_width * config.display_height],
            next_stage: None,
            kernels,
            config,
            kappa,
            offset,
        })
    }

    /// Validates a frame against the configured shape
    fn validate_frame(&self, frame: &Image) -> HarrisResult<()> {
        if frame.stride() != self.config.width
            || frame.height() != self.config.height
            || frame.channels() != self.config.channels
        {
            return Err(HarrisError::FrameMismatch {
                expected_width: self.config.width,
                expected_height: self.config.height,
                expected_channels: self.config.channels,
                width: frame.stride(),
                height: frame.height(),
                channels: frame.channels(),
            });
        }
        Ok(())
    }

    /// Start a pass over `frame`. Any pass still in progress is abandoned.
    pub fn begin(&mut self, frame: &Image) -> HarrisResult<()> {
        self.validate_frame(frame)?;
        self.input.copy_from(frame);
        self.next_stage = Some(Stage::Gradient);
        Ok(())
    }

    /// Run the next stage of the current pass and return which one ran
    pub fn step(&mut self) -> HarrisResult<Stage> {
        let stage = self.next_stage.ok_or(HarrisError::NoFrameInProgress)?;
        let t0 = Instant::now();

        match stage {
            Stage::Gradient => {
                let source = match &mut self.pre_smoothed {
                    Some((kind, smoothed)) => {
                        valid_convolve_into(&self.input, self.kernels.kernel(*kind), smoothed);
                        &*smoothed
                    }
                    None => &self.input,
                };
                valid_convolve_into(source, self.kernels.kernel(KernelKind::SobelX), &mut self.ix);
                valid_convolve_into(source, self.kernels.kernel(KernelKind::SobelY), &mut self.iy);
                multiply_into(&self.ix, &self.ix, &mut self.ixx);
                multiply_into(&self.iy, &self.iy, &mut self.iyy);
                multiply_into(&self.ix, &self.iy, &mut self.ixy);
            }
            Stage::Smoothing => {
                let window = self.kernels.kernel(self.config.smoothing);
                valid_convolve_into(&self.ixx, window, &mut self.sxx);
                valid_convolve_into(&self.iyy, window, &mut self.syy);
                valid_convolve_into(&self.ixy, window, &mut self.sxy);
            }
            Stage::Response => {
                self.tensor.fill_from_products(&self.sxx, &self.syy, &self.sxy);
                self.tensor.response_into(self.kappa, &mut self.response);
            }
            Stage::Normalize => {
                value_scale_to_unit_range_uniform(&mut self.response);
                convert_to_display_into(&self.response, self.config.display_width, &mut self.display);
            }
        }

        debug!("{:?} stage finished in {:.2?}", stage, t0.elapsed());
        self.next_stage = stage.next();
        Ok(stage)
    }

    /// Whether a pass has been started and not yet completed
    pub fn in_progress(&self) -> bool {
        self.next_stage.is_some()
    }

    /// Run a full pass and return the normalised response
    pub fn run(&mut self, frame: &Image) -> HarrisResult<&Image> {
        self.run_with_progress(frame, |_| {})
    }

    /// Run a full pass, reporting each completed stage to `on_stage`
    pub fn run_with_progress<F: FnMut(Stage)>(&mut self, frame: &Image, mut on_stage: F) -> HarrisResult<&Image> {
        self.begin(frame)?;
        while self.in_progress() {
            let stage = self.step()?;
            on_stage(stage);
        }
        Ok(&self.response)
    }

    /// Response buffer of the most recent pass (normalised once the pass
    /// has completed)
    pub fn response(&self) -> &Image {
        &self.response
    }

    pub fn response_stride(&self) -> usize {
        self.response.stride()
    }

    pub fn response_height(&self) -> usize {
        self.response.height()
    }

    /// RGBA presentation of the normalised response
    pub fn display(&self) -> &[[u8; 4]] {
        &self.display
    }

    pub fn display_dimensions(&self) -> (usize, usize) {
        (self.config.display_width, self.config.display_height)
    }

    /// `(row, col)` to add to a response-buffer coordinate to land on the
    /// input pixel at the centre of its kernel footprint
    pub fn offset(&self) -> (usize, usize) {
        self.offset
    }

    /// Effective (clamped) Harris sensitivity
    pub fn kappa(&self) -> f64 {
        self.kappa
    }

    /// Get pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn kernels(&self) -> &S {
        &self.kernels
    }
}
