//! Pointer filter — exponential smoothing of the tracked fingertip.
//!
//! Each detection frame the raw fingertip (already in pixel space) is blended
//! into the running position:
//!
//! ```text
//! smoothed = smoothed·(1 − α) + raw·α
//! ```
//!
//! α is a fixed tuning constant; it is not scaled by frame time, so the
//! effective lag depends on the detector's frame rate.
//!
//! Frames without a hand do not move the pointer.  After more than
//! `miss_tolerance` consecutive misses the pointer is reported hidden; its
//! last position is kept and smoothing resumes from it when the hand returns.

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::geometry::Point;

pub const DEFAULT_SMOOTHING: f32 = 0.5;
pub const DEFAULT_MISS_TOLERANCE: u32 = 5;

/// Validated smoothing factor α ∈ (0, 1].  1.0 disables smoothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothingFactor(f32);

impl SmoothingFactor {
    pub fn new(alpha: f32) -> Result<Self, ConfigError> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ConfigError::SmoothingFactor(alpha));
        }
        Ok(SmoothingFactor(alpha))
    }

    pub fn get(self) -> f32 { self.0 }
}

impl Default for SmoothingFactor {
    fn default() -> Self { SmoothingFactor(DEFAULT_SMOOTHING) }
}

/// Snapshot of the pointer after one update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerState {
    /// Last smoothed position; `None` until a hand has been seen.
    pub position: Option<Point>,
    /// False once the hand has been missing for longer than the tolerance.
    pub visible: bool,
    pub missed_frames: u32,
}

impl PointerState {
    /// Position only while the pointer is visible.
    pub fn visible_position(&self) -> Option<Point> {
        if self.visible { self.position } else { None }
    }
}

#[derive(Debug, Clone)]
pub struct PointerFilter {
    alpha:          SmoothingFactor,
    miss_tolerance: u32,
    smoothed:       Option<Point>,
    missed:         u32,
}

impl PointerFilter {
    pub fn new(alpha: SmoothingFactor, miss_tolerance: u32) -> Self {
        PointerFilter { alpha, miss_tolerance, smoothed: None, missed: 0 }
    }

    /// Seed the accumulator so the first sample is blended rather than
    /// adopted outright.
    pub fn with_initial(mut self, start: Point) -> Self {
        self.smoothed = Some(start);
        self
    }

    pub fn update(&mut self, raw: Option<Point>) -> PointerState {
        match raw {
            Some(raw) => {
                if self.missed > self.miss_tolerance {
                    debug!("pointer reacquired after {} missed frames", self.missed);
                }
                self.missed = 0;
                let next = match self.smoothed {
                    Some(prev) => prev.lerp(raw, self.alpha.get()),
                    None       => raw,
                };
                trace!("pointer raw=({:.1},{:.1}) smoothed=({:.1},{:.1})",
                       raw.x, raw.y, next.x, next.y);
                self.smoothed = Some(next);
            }
            None => {
                self.missed = self.missed.saturating_add(1);
                if self.missed == self.miss_tolerance.saturating_add(1) {
                    debug!("pointer hidden after {} missed frames", self.missed);
                }
            }
        }
        self.state()
    }

    pub fn state(&self) -> PointerState {
        PointerState {
            position:      self.smoothed,
            visible:       !self.is_hidden(),
            missed_frames: self.missed,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.smoothed.is_none() || self.missed > self.miss_tolerance
    }

    /// Forget the accumulated position.
    pub fn reset(&mut self) {
        self.smoothed = None;
        self.missed = 0;
    }
}

impl Default for PointerFilter {
    fn default() -> Self {
        PointerFilter::new(SmoothingFactor::default(), DEFAULT_MISS_TOLERANCE)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    fn filter(alpha: f32, tolerance: u32) -> PointerFilter {
        PointerFilter::new(SmoothingFactor::new(alpha).unwrap(), tolerance)
    }

    #[test_case(0.0  ; "zero")]
    #[test_case(-0.2 ; "negative")]
    #[test_case(1.01 ; "above one")]
    #[test_case(f32::NAN ; "nan")]
    fn smoothing_factor_rejected(alpha: f32) {
        assert!(SmoothingFactor::new(alpha).is_err());
    }

    #[test]
    fn half_alpha_from_origin() {
        let mut f = filter(0.5, 3).with_initial(Point::ORIGIN);
        let a = f.update(Some(Point::new(0.0, 0.0)));
        let b = f.update(Some(Point::new(10.0, 10.0)));
        assert_eq!(a.position, Some(Point::new(0.0, 0.0)));
        assert_eq!(b.position, Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn first_sample_adopted_without_seed() {
        let mut f = filter(0.2, 3);
        let s = f.update(Some(Point::new(300.0, 200.0)));
        assert_eq!(s.position, Some(Point::new(300.0, 200.0)));
        assert!(s.visible);
    }

    #[test]
    fn converges_to_constant_input() {
        let mut f = filter(0.3, 3).with_initial(Point::ORIGIN);
        let target = Point::new(640.0, 360.0);
        let mut last = Point::ORIGIN;
        for _ in 0..60 {
            last = f.update(Some(target)).position.unwrap();
        }
        assert!(last.distance(target) < 0.01);
    }

    #[test]
    fn outlier_moves_at_most_alpha_times_jump() {
        let mut f = filter(0.25, 3).with_initial(Point::new(100.0, 100.0));
        let before = Point::new(100.0, 100.0);
        let outlier = Point::new(900.0, 500.0);
        let after = f.update(Some(outlier)).position.unwrap();
        assert_relative_eq!(
            after.distance(before),
            0.25 * outlier.distance(before),
            epsilon = 1e-3
        );
    }

    #[test]
    fn dropout_holds_position() {
        let mut f = filter(0.5, 2);
        f.update(Some(Point::new(50.0, 60.0)));
        let s = f.update(None);
        assert_eq!(s.position, Some(Point::new(50.0, 60.0)));
        assert!(s.visible);
        assert_eq!(s.missed_frames, 1);
    }

    #[test]
    fn hidden_after_tolerance_then_resumes_from_last() {
        let mut f = filter(0.5, 2);
        f.update(Some(Point::new(100.0, 100.0)));
        assert!(f.update(None).visible);
        assert!(f.update(None).visible);
        let hidden = f.update(None);
        assert!(!hidden.visible);
        assert_eq!(hidden.visible_position(), None);
        assert_eq!(hidden.position, Some(Point::new(100.0, 100.0)));

        let back = f.update(Some(Point::new(200.0, 100.0)));
        assert!(back.visible);
        assert_eq!(back.position, Some(Point::new(150.0, 100.0)));
    }

    #[test]
    fn hidden_before_first_sighting() {
        let mut f = PointerFilter::default();
        let s = f.update(None);
        assert!(!s.visible);
        assert_eq!(s.position, None);
    }

    #[test]
    fn reset_forgets_accumulator() {
        let mut f = filter(0.5, 2);
        f.update(Some(Point::new(100.0, 100.0)));
        f.reset();
        let s = f.update(Some(Point::new(10.0, 20.0)));
        assert_eq!(s.position, Some(Point::new(10.0, 20.0)));
    }
}
