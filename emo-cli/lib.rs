use std::path::Path;

use emo_core::{init_thread_pool, Corner, CornerPoint, DetectionConfig, Image};
use emo_harris::{CornerPipeline, HarrisError, PipelineBuilder, PipelineConfig, Stage};
use emo_select::{CornerSelector, SelectError};
use log::{debug, info};
use thiserror::Error;

pub use emo_core::{self, Image as EmoImage, DetectionConfig as Config};

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Response pipeline error: {0}")]
    Harris(#[from] HarrisError),

    #[error("Corner selection error: {0}")]
    Select(#[from] SelectError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type FinderResult<T> = Result<T, FinderError>;

/// High-level corner finder that runs the Harris response pipeline and
/// picks spread-out corners from the result
pub struct CornerFinder {
    pipeline: CornerPipeline,
    selector: CornerSelector,
    cfg: DetectionConfig,
}

impl CornerFinder {
    /// Create a finder for `width x height` frames with `channels` planes,
    /// using the default 9x9 smoothing window
    pub fn new(cfg: DetectionConfig, width: usize, height: usize, channels: usize) -> FinderResult<Self> {
        let pipeline_cfg = PipelineBuilder::new(width, height).channels(channels).to_config();
        Self::with_pipeline_config(cfg, pipeline_cfg)
    }

    /// Create a finder from an explicit pipeline configuration. The
    /// detection config's `kappa` replaces the pipeline's.
    pub fn with_pipeline_config(cfg: DetectionConfig, pipeline_cfg: PipelineConfig) -> FinderResult<Self> {
        // The global pool can only be installed once per process; later
        // finders share it.
        if let Err(err) = init_thread_pool(cfg.n_threads) {
            debug!("Keeping existing thread pool: {}", err);
        }

        let selector = CornerSelector::from_config(&cfg)?;
        let pipeline = pipeline_cfg.to_builder().kappa(cfg.kappa).build()?;
        info!(
            "Corner finder ready: {} corners, min distance {}, ahead cost {}",
            cfg.n_corners, cfg.min_distance, cfg.ahead_cost
        );

        Ok(Self {
            pipeline,
            selector,
            cfg,
        })
    }

    /// Detect corners and return them in input-image coordinates, best first
    pub fn detect(&mut self, img: &Image) -> FinderResult<Vec<CornerPoint>> {
        self.detect_with_progress(img, |_| {})
    }

    /// Like [`detect`](Self::detect), reporting each finished pipeline stage
    pub fn detect_with_progress<F: FnMut(Stage)>(&mut self, img: &Image, on_stage: F) -> FinderResult<Vec<CornerPoint>> {
        let corners = self.detect_corners_with_progress(img, on_stage)?;
        let stride = self.pipeline.response_stride();
        let offset = self.pipeline.offset();
        Ok(corners.iter().map(|c| c.point(stride, offset)).collect())
    }

    /// Detect corners in response-buffer coordinates
    pub fn detect_corners(&mut self, img: &Image) -> FinderResult<Vec<Corner>> {
        self.detect_corners_with_progress(img, |_| {})
    }

    fn detect_corners_with_progress<F: FnMut(Stage)>(&mut self, img: &Image, on_stage: F) -> FinderResult<Vec<Corner>> {
        let response = self.pipeline.run_with_progress(img, on_stage)?;
        Ok(self.selector.select(response))
    }

    /// Normalised response of the last detection
    pub fn response(&self) -> &Image {
        self.pipeline.response()
    }

    /// RGBA visualisation of the last response
    pub fn display(&self) -> &[[u8; 4]] {
        self.pipeline.display()
    }

    pub fn display_dimensions(&self) -> (usize, usize) {
        self.pipeline.display_dimensions()
    }

    /// Get detection configuration
    pub fn config(&self) -> &DetectionConfig {
        &self.cfg
    }

    pub fn pipeline(&self) -> &CornerPipeline {
        &self.pipeline
    }

    /// Get image dimensions
    pub fn dimensions(&self) -> (usize, usize) {
        let cfg = self.pipeline.config();
        (cfg.width, cfg.height)
    }
}

/// Decode an image file into a three-channel frame with samples in [0, 1]
pub fn load_rgb<P: AsRef<Path>>(path: P) -> FinderResult<Image> {
    let rgb = image::ImageReader::open(path)
        .map_err(image::ImageError::IoError)?
        .decode()?
        .to_rgb8();
    let (w, _) = rgb.dimensions();
    let samples: Vec<f64> = rgb.as_raw().iter().map(|&v| v as f64 / 255.0).collect();
    Ok(Image::from_interleaved(w as usize, 3, &samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(n_corners: usize, min_distance: usize) -> DetectionConfig {
        DetectionConfig {
            n_corners,
            min_distance,
            n_threads: 2,
            ..DetectionConfig::default()
        }
    }

    #[test]
    fn test_single_bright_pixel_is_top_corner() {
        let mut img = Image::new(9, 9, 1);
        img.set(4, 4, 0, 1.0);

        let pipeline_cfg = PipelineConfig::responsive(9, 9).to_builder().channels(1).to_config();
        let mut finder = CornerFinder::with_pipeline_config(detection(1, 0), pipeline_cfg).unwrap();
        let points = finder.detect(&img).unwrap();

        assert_eq!(points, vec![CornerPoint { row: 4, col: 4, channel: 0 }]);
    }

    #[test]
    fn test_flat_frame_does_not_fail() {
        let img = Image::new(50, 50, 3);
        let mut finder = CornerFinder::new(detection(5, 0), 50, 50, 3).unwrap();
        let points = finder.detect(&img).unwrap();
        assert!(points.len() <= 5);
        assert!(finder.response().planes().iter().flatten().all(|&v| v == 0.0));
    }

    #[test]
    fn test_isolated_channel_is_not_starved() {
        // Channel 0: ten equally bright dots. Channel 1: one dimmer dot.
        let mut img = Image::new(40, 40, 2);
        for row in [4, 12] {
            for col in [4, 12, 20, 28, 36] {
                img.set(row, col, 0, 1.0);
            }
        }
        img.set(28, 28, 1, 0.8);

        let cfg = DetectionConfig {
            ahead_cost: 1.4,
            ..detection(11, 0)
        };
        let pipeline_cfg = PipelineConfig::responsive(40, 40).to_builder().channels(2).to_config();
        let mut finder = CornerFinder::with_pipeline_config(cfg, pipeline_cfg).unwrap();
        let points = finder.detect(&img).unwrap();

        let b = points
            .iter()
            .position(|p| p.channel == 1)
            .expect("channel 1 must contribute a corner");
        assert!(b < 10);
        assert_eq!((points[b].row, points[b].col), (28, 28));
    }

    #[test]
    fn test_progress_reports_every_stage() {
        let img = Image::filled(30, 30, 3, 0.5);
        let mut finder = CornerFinder::new(detection(3, 2), 30, 30, 3).unwrap();
        let mut stages = Vec::new();
        finder.detect_with_progress(&img, |s| stages.push(s)).unwrap();
        assert_eq!(stages, Stage::ALL.to_vec());
    }

    #[test]
    fn test_errors_surface_from_each_layer() {
        assert!(matches!(
            CornerFinder::new(detection(0, 0), 30, 30, 3),
            Err(FinderError::Select(SelectError::ZeroCorners))
        ));
        assert!(matches!(
            CornerFinder::new(detection(5, 0), 8, 8, 3),
            Err(FinderError::Harris(HarrisError::ImageTooSmall { .. }))
        ));
        let nan_kappa = DetectionConfig {
            kappa: f64::NAN,
            ..detection(5, 0)
        };
        assert!(matches!(
            CornerFinder::new(nan_kappa, 30, 30, 3),
            Err(FinderError::Harris(HarrisError::InvalidKappa(_)))
        ));

        let mut finder = CornerFinder::new(detection(5, 0), 30, 30, 3).unwrap();
        assert!(matches!(
            finder.detect(&Image::new(30, 30, 1)),
            Err(FinderError::Harris(HarrisError::FrameMismatch { .. }))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(load_rgb("does/not/exist.png"), Err(FinderError::Image(_))));
    }
}
