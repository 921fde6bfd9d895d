use emo_core::{Corner, DetectionConfig, Image};
use log::debug;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectError {
    #[error("Requested corner count must be positive")]
    ZeroCorners,

    #[error("Ahead cost {0} must be finite and >= 1")]
    InvalidAheadCost(f64),
}

/// Greedy multi-channel corner picker.
///
/// Channels take turns according to their best remaining response,
/// discounted the further a channel has pulled ahead of the others, and a
/// candidate is dropped when it falls inside `min_distance` of an earlier
/// pick on both axes.
#[derive(Debug, Clone)]
pub struct CornerSelector {
    n_corners: usize,
    ahead_cost: f64,
    min_distance: usize,
}

impl CornerSelector {
    pub fn new(n_corners: usize, ahead_cost: f64, min_distance: usize) -> Result<Self, SelectError> {
        if n_corners == 0 {
            return Err(SelectError::ZeroCorners);
        }
        if !ahead_cost.is_finite() || ahead_cost < 1.0 {
            return Err(SelectError::InvalidAheadCost(ahead_cost));
        }
        Ok(Self {
            n_corners,
            ahead_cost,
            min_distance,
        })
    }

    pub fn from_config(cfg: &DetectionConfig) -> Result<Self, SelectError> {
        Self::new(cfg.n_corners, cfg.ahead_cost, cfg.min_distance)
    }

    pub fn n_corners(&self) -> usize {
        self.n_corners
    }

    pub fn ahead_cost(&self) -> f64 {
        self.ahead_cost
    }

    pub fn min_distance(&self) -> usize {
        self.min_distance
    }

    /// Pick up to `n_corners` positions from `response`, best first.
    ///
    /// Returns fewer when every channel runs out of candidates.
    pub fn select(&self, response: &Image) -> Vec<Corner> {
        let stride = response.stride();
        let len = response.pixel_count();
        let orders: Vec<Vec<usize>> = response.planes().par_iter().map(|p| rank_channel(p)).collect();

        let mut taken = vec![0usize; orders.len()];
        let mut picks: Vec<Corner> = Vec::with_capacity(self.n_corners.min(len));
        let mut rejected = 0usize;

        while picks.len() < self.n_corners {
            // Scores are divided by ahead_cost^(cursor - lowest cursor), which
            // ranks channels exactly like multiplying by
            // ahead_cost^(leading cursor - cursor) without overflowing.
            let Some(base) = taken.iter().copied().filter(|&t| t < len).min() else {
                break;
            };

            let mut best: Option<(usize, f64)> = None;
            for (ch, order) in orders.iter().enumerate() {
                let cursor = taken[ch];
                if cursor >= len {
                    continue;
                }
                let value = sample(response.plane(ch)[order[cursor]]);
                let score = value / self.ahead_cost.powf((cursor - base) as f64);
                let better = match best {
                    None => true,
                    Some((best_ch, best_score)) => {
                        score > best_score || (score == best_score && cursor < taken[best_ch])
                    }
                };
                if better {
                    best = Some((ch, score));
                }
            }

            let Some((ch, _)) = best else {
                break;
            };
            let position = orders[ch][taken[ch]];
            taken[ch] += 1;

            if self.collides(position, stride, &picks) {
                rejected += 1;
                continue;
            }
            picks.push(Corner {
                position,
                channel: ch,
                response: response.plane(ch)[position],
            });
        }

        debug!(
            "Selected {}/{} corners ({} rejected by distance, cursors {:?})",
            picks.len(),
            self.n_corners,
            rejected,
            taken
        );
        picks
    }

    /// A candidate collides with a pick at the same position or one closer
    /// than `min_distance` on both the row and the column axis.
    fn collides(&self, position: usize, stride: usize, picks: &[Corner]) -> bool {
        let (row, col) = (position / stride, position % stride);
        picks.iter().any(|p| {
            if p.position == position {
                return true;
            }
            let (pr, pc) = (p.position / stride, p.position % stride);
            row.abs_diff(pr) < self.min_distance && col.abs_diff(pc) < self.min_distance
        })
    }
}

/// NaN ranks below every real response.
#[inline]
fn sample(v: f64) -> f64 {
    if v.is_nan() {
        f64::NEG_INFINITY
    } else {
        v
    }
}

/// Positions of `plane` ordered by descending value; equal values keep
/// their original order.
pub fn rank_channel(plane: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..plane.len()).collect();
    order.sort_by(|&a, &b| sample(plane[b]).total_cmp(&sample(plane[a])));
    order
}
