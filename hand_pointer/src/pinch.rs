//! Pinch detector — thumb/index distance debounced into press/release edges.
//!
//! # State machine
//!
//! ```text
//!              distance < enter
//!   Released ───────────────────▶ Pressed      (edge: Pressed)
//!       ▲                            │
//!       └────────────────────────────┘
//!              distance > exit                  (edge: Released)
//! ```
//!
//! `enter < exit`; distances inside the band `[enter, exit]` never change the
//! state, so tremor around either threshold cannot chatter.
//!
//! Frames with no usable hand hold the current state.  Once more than
//! `miss_tolerance` consecutive frames are missing, a held press is forced
//! to release so no key can stay stuck down.

use tracing::debug;

use crate::error::ConfigError;
use crate::landmark::Landmark;

pub const DEFAULT_ENTER: f32 = 0.05;
pub const DEFAULT_EXIT:  f32 = 0.08;

/// Hysteresis band in normalized landmark units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchThresholds {
    enter: f32,
    exit:  f32,
}

impl PinchThresholds {
    pub fn new(enter: f32, exit: f32) -> Result<Self, ConfigError> {
        if !(enter > 0.0 && enter < exit && exit.is_finite()) {
            return Err(ConfigError::PinchBand { enter, exit });
        }
        Ok(PinchThresholds { enter, exit })
    }

    pub fn enter(&self) -> f32 { self.enter }
    pub fn exit(&self)  -> f32 { self.exit }
}

impl Default for PinchThresholds {
    fn default() -> Self { PinchThresholds { enter: DEFAULT_ENTER, exit: DEFAULT_EXIT } }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickState { Released, Pressed }

/// Emitted only on a state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinchEdge { None, Pressed, Released }

#[derive(Debug, Clone)]
pub struct PinchDetector {
    thresholds:     PinchThresholds,
    miss_tolerance: u32,
    state:          ClickState,
    missed:         u32,
    last_distance:  Option<f32>,
}

impl PinchDetector {
    pub fn new(thresholds: PinchThresholds, miss_tolerance: u32) -> Self {
        PinchDetector {
            thresholds,
            miss_tolerance,
            state: ClickState::Released,
            missed: 0,
            last_distance: None,
        }
    }

    /// Feed one frame's thumb and index tips.
    pub fn update(&mut self, thumb: Landmark, index: Landmark) -> PinchEdge {
        self.update_distance(thumb.distance(&index))
    }

    /// Feed a precomputed pinch distance.
    pub fn update_distance(&mut self, distance: f32) -> PinchEdge {
        self.missed = 0;
        self.last_distance = Some(distance);

        match self.state {
            ClickState::Released if distance < self.thresholds.enter => {
                self.state = ClickState::Pressed;
                debug!("pinch pressed (distance={:.3})", distance);
                PinchEdge::Pressed
            }
            ClickState::Pressed if distance > self.thresholds.exit => {
                self.state = ClickState::Released;
                debug!("pinch released (distance={:.3})", distance);
                PinchEdge::Released
            }
            _ => PinchEdge::None,
        }
    }

    /// Record a frame with no usable hand.
    pub fn miss(&mut self) -> PinchEdge {
        self.missed = self.missed.saturating_add(1);
        self.last_distance = None;

        if self.state == ClickState::Pressed && self.missed > self.miss_tolerance {
            self.state = ClickState::Released;
            debug!("pinch force-released after {} missed frames", self.missed);
            return PinchEdge::Released;
        }
        PinchEdge::None
    }

    pub fn state(&self) -> ClickState { self.state }
    pub fn is_pressed(&self) -> bool { self.state == ClickState::Pressed }
    pub fn thresholds(&self) -> PinchThresholds { self.thresholds }

    /// Distance seen on the most recent frame with a hand.
    pub fn last_distance(&self) -> Option<f32> { self.last_distance }
}

impl Default for PinchDetector {
    fn default() -> Self {
        PinchDetector::new(PinchThresholds::default(), crate::pointer::DEFAULT_MISS_TOLERANCE)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
