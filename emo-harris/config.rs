use emo_core::KAPPA_RANGE;

use crate::builder::PipelineBuilder;
use crate::error::{HarrisError, HarrisResult};
use crate::kernels::KernelKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Complete pipeline configuration with all settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineConfig {
    /// Input frame dimensions
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    /// Harris sensitivity; clamped into [0.04, 0.15] when the pipeline is built
    pub kappa: f64,
    /// Window applied to the gradient products
    pub smoothing: KernelKind,
    /// Optional Gaussian run over the input before the Sobel stage
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub pre_smoothing: Option<KernelKind>,
    /// Presentation canvas the normalised response is centred on
    pub display_width: usize,
    pub display_height: usize,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
}

impl PipelineConfig {
    /// Create new configuration with default settings
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            channels: 3,
            kappa: 0.1,
            smoothing: KernelKind::Gaussian9Sigma3,
            pre_smoothing: None,
            display_width: width,
            display_height: height,
            name: None,
        }
    }

    /// Small smoothing window for low latency and small frames
    pub fn responsive(width: usize, height: usize) -> Self {
        Self {
            smoothing: KernelKind::Gaussian5Sigma1,
            name: Some("Responsive".to_string()),
            ..Self::new(width, height)
        }
    }

    /// Wide smoothing window, steadier picks on noisy camera frames
    pub fn stable(width: usize, height: usize) -> Self {
        Self {
            kappa: 0.06,
            smoothing: KernelKind::Gaussian9Sigma3,
            name: Some("Stable".to_string()),
            ..Self::new(width, height)
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Convert to PipelineBuilder for further customization
    pub fn to_builder(self) -> PipelineBuilder {
        PipelineBuilder::from_config(self)
    }

    pub fn clamped_kappa(&self) -> f64 {
        self.kappa.clamp(*KAPPA_RANGE.start(), *KAPPA_RANGE.end())
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "PipelineConfig: {}x{}x{}, kappa={:.3}, pre_smoothing={:?}, smoothing={:?}, display={}x{}",
            self.width,
            self.height,
            self.channels,
            self.kappa,
            self.pre_smoothing,
            self.smoothing,
            self.display_width,
            self.display_height
        )
    }

    /// Validate parameters that do not depend on kernel sizes
    pub fn validate(&self) -> HarrisResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(HarrisError::InvalidImageSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.channels == 0 {
            return Err(HarrisError::NoChannels);
        }
        if !self.kappa.is_finite() {
            return Err(HarrisError::InvalidKappa(self.kappa));
        }
        if !self.smoothing.is_gaussian() {
            return Err(HarrisError::InvalidSmoothingKernel(self.smoothing));
        }
        if let Some(kind) = self.pre_smoothing.filter(|k| !k.is_gaussian()) {
            return Err(HarrisError::InvalidSmoothingKernel(kind));
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> HarrisResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> HarrisResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> HarrisResult<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> HarrisResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> HarrisResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> HarrisResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> HarrisResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> HarrisResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PipelineConfig::new(64, 48);
        assert_eq!(cfg.channels, 3);
        assert_eq!(cfg.smoothing, KernelKind::Gaussian9Sigma3);
        assert_eq!((cfg.display_width, cfg.display_height), (64, 48));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let r = PipelineConfig::responsive(32, 32);
        assert_eq!(r.smoothing, KernelKind::Gaussian5Sigma1);
        assert_eq!(r.name.as_deref(), Some("Responsive"));
        let s = PipelineConfig::stable(32, 32);
        assert_eq!(s.kappa, 0.06);
    }

    #[test]
    fn test_validation_errors() {
        let mut cfg = PipelineConfig::new(0, 10);
        assert!(matches!(cfg.validate(), Err(HarrisError::InvalidImageSize { .. })));

        cfg = PipelineConfig::new(10, 10);
        cfg.channels = 0;
        assert!(matches!(cfg.validate(), Err(HarrisError::NoChannels)));

        cfg = PipelineConfig::new(10, 10);
        cfg.smoothing = KernelKind::SobelX;
        assert!(matches!(
            cfg.validate(),
            Err(HarrisError::InvalidSmoothingKernel(KernelKind::SobelX))
        ));
    }

    #[test]
    fn test_non_finite_kappa_is_rejected() {
        let mut cfg = PipelineConfig::new(10, 10);
        cfg.kappa = f64::NAN;
        assert!(matches!(cfg.validate(), Err(HarrisError::InvalidKappa(k)) if k.is_nan()));
        cfg.kappa = f64::INFINITY;
        assert!(matches!(cfg.validate(), Err(HarrisError::InvalidKappa(_))));
    }

    #[test]
    fn test_pre_smoothing_must_be_gaussian() {
        let mut cfg = PipelineConfig::new(20, 20);
        cfg.pre_smoothing = Some(KernelKind::SobelY);
        assert!(matches!(
            cfg.validate(),
            Err(HarrisError::InvalidSmoothingKernel(KernelKind::SobelY))
        ));
        cfg.pre_smoothing = Some(KernelKind::Gaussian5Sigma1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_kappa_clamping() {
        let mut cfg = PipelineConfig::new(10, 10);
        cfg.kappa = 1.0;
        assert_eq!(cfg.clamped_kappa(), 0.15);
        cfg.kappa = 0.01;
        assert_eq!(cfg.clamped_kappa(), 0.04);
        cfg.kappa = 0.08;
        assert_eq!(cfg.clamped_kappa(), 0.08);
    }

    #[test]
    fn test_summary_mentions_dimensions() {
        let s = PipelineConfig::new(20, 10).summary();
        assert!(s.contains("20x10x3"));
        assert!(s.contains("Gaussian9Sigma3"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_and_toml_round_trip() {
        let mut cfg = PipelineConfig::responsive(40, 30).with_name("camera");
        cfg.pre_smoothing = Some(KernelKind::Gaussian5Sigma3);
        let json = cfg.to_json().unwrap();
        assert_eq!(PipelineConfig::from_json(&json).unwrap(), cfg);
        let toml = cfg.to_toml().unwrap();
        assert_eq!(PipelineConfig::from_toml(&toml).unwrap(), cfg);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_invalid_json_is_rejected() {
        let mut cfg = PipelineConfig::new(10, 10);
        cfg.channels = 0;
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(matches!(PipelineConfig::from_json(&json), Err(HarrisError::NoChannels)));
    }
}
