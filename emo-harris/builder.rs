use crate::config::PipelineConfig;
use crate::error::HarrisResult;
use crate::kernels::{KernelKind, KernelSource};
use crate::pipeline::CornerPipeline;

/// Builder for creating a `CornerPipeline`
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Create a new builder with default settings
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            config: PipelineConfig::new(width, height),
        }
    }

    /// Number of channels per input frame
    pub fn channels(mut self, channels: usize) -> Self {
        self.config.channels = channels;
        self
    }

    /// Set the Harris sensitivity
    pub fn kappa(mut self, kappa: f64) -> Self {
        self.config.kappa = kappa;
        self
    }

    /// Set the Gaussian applied to the gradient products
    pub fn smoothing(mut self, kind: KernelKind) -> Self {
        self.config.smoothing = kind;
        self
    }

    /// Smooth the input with `kind` before taking gradients
    pub fn pre_smoothing(mut self, kind: KernelKind) -> Self {
        self.config.pre_smoothing = Some(kind);
        self
    }

    /// Set the presentation canvas size
    pub fn display_size(mut self, width: usize, height: usize) -> Self {
        self.config.display_width = width;
        self.config.display_height = height;
        self
    }

    /// Apply the responsive preset
    pub fn preset_responsive(mut self) -> Self {
        let preset = PipelineConfig::responsive(self.config.width, self.config.height);
        self.config.kappa = preset.kappa;
        self.config.smoothing = preset.smoothing;
        self
    }

    /// Apply the stable preset
    pub fn preset_stable(mut self) -> Self {
        let preset = PipelineConfig::stable(self.config.width, self.config.height);
        self.config.kappa = preset.kappa;
        self.config.smoothing = preset.smoothing;
        self
    }

    /// Build a pipeline backed by the process-wide kernel registry
    pub fn build(self) -> HarrisResult<CornerPipeline> {
        CornerPipeline::new(self.config)
    }

    /// Build a pipeline that looks kernels up in `kernels`
    pub fn build_with_kernels<S: KernelSource>(self, kernels: S) -> HarrisResult<CornerPipeline<S>> {
        CornerPipeline::with_kernels(self.config, kernels)
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        self.config.summary()
    }

    /// Create a builder from an existing `PipelineConfig`
    pub fn from_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Convert the builder into a `PipelineConfig`
    pub fn to_config(self) -> PipelineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fluent_settings() {
        let cfg = PipelineBuilder::new(50, 40)
            .channels(4)
            .kappa(0.05)
            .smoothing(KernelKind::Gaussian5Sigma3)
            .pre_smoothing(KernelKind::Gaussian5Sigma1)
            .display_size(64, 64)
            .to_config();
        assert_eq!(cfg.pre_smoothing, Some(KernelKind::Gaussian5Sigma1));
        assert_eq!(cfg.channels, 4);
        assert_eq!(cfg.kappa, 0.05);
        assert_eq!(cfg.smoothing, KernelKind::Gaussian5Sigma3);
        assert_eq!((cfg.display_width, cfg.display_height), (64, 64));
    }

    #[test]
    fn test_presets_keep_dimensions() {
        let cfg = PipelineBuilder::new(30, 20).channels(1).preset_responsive().to_config();
        assert_eq!((cfg.width, cfg.height, cfg.channels), (30, 20, 1));
        assert_eq!(cfg.smoothing, KernelKind::Gaussian5Sigma1);
    }

    #[test]
    fn test_config_round_trip() {
        let cfg = PipelineConfig::stable(16, 16);
        let back = cfg.clone().to_builder().to_config();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_build() {
        let pipeline = PipelineBuilder::new(24, 24).preset_responsive().build();
        assert!(pipeline.is_ok());
        let too_small = PipelineBuilder::new(8, 8).build();
        assert!(too_small.is_err());
    }
}
