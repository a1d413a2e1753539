//! The per-frame pipeline and the context object that owns its state.
//!
//! ```text
//! hands ─▶ fingertips ─▶ PointerFilter ─┬─▶ resolve(regions) ─┐
//!                   └──▶ PinchDetector ─┴──────────────────────┴─▶ Dispatcher ─▶ events
//! ```
//!
//! [`GesturePipeline::step`] runs every stage in that order, synchronously,
//! once per detection frame.  All mutable state (pointer accumulator, click
//! state, held key) lives in the pipeline value; nothing is global.

use tracing::trace;

use crate::dispatch::{Dispatcher, DriftPolicy, InteractionEvent};
use crate::geometry::Surface;
use crate::hit_test::{resolve, HitRegion, RegionId};
use crate::landmark::{Fingertips, Hand};
use crate::pinch::{PinchDetector, PinchEdge, PinchThresholds};
use crate::pointer::{PointerFilter, PointerState, SmoothingFactor, DEFAULT_MISS_TOLERANCE};

/// Startup tuning for the whole pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineConfig {
    pub smoothing:      SmoothingFactor,
    pub thresholds:     PinchThresholds,
    /// Consecutive hand-less frames tolerated before the pointer hides and a
    /// held pinch is force-released.
    pub miss_tolerance: u32,
    pub drift_policy:   DriftPolicy,
    /// Flip landmark x before use (camera sources deliver an unmirrored view).
    pub mirror:         bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            smoothing:      SmoothingFactor::default(),
            thresholds:     PinchThresholds::default(),
            miss_tolerance: DEFAULT_MISS_TOLERANCE,
            drift_policy:   DriftPolicy::default(),
            mirror:         false,
        }
    }
}

/// Everything one frame produced.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutput {
    pub pointer:    PointerState,
    pub edge:       PinchEdge,
    /// Pinch state after this frame.
    pub pinched:    bool,
    /// Region under the visible pointer, for hover feedback.
    pub hovered:    Option<RegionId>,
    pub events:     Vec<InteractionEvent>,
    /// Tips actually used this frame (after mirroring), if any.
    pub fingertips: Option<Fingertips>,
}

#[derive(Debug, Clone)]
pub struct GesturePipeline {
    config:     PipelineConfig,
    pointer:    PointerFilter,
    pinch:      PinchDetector,
    dispatcher: Dispatcher,
    frames:     u64,
}

impl GesturePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        GesturePipeline {
            config,
            pointer:    PointerFilter::new(config.smoothing, config.miss_tolerance),
            pinch:      PinchDetector::new(config.thresholds, config.miss_tolerance),
            dispatcher: Dispatcher::new(config.drift_policy),
            frames:     0,
        }
    }

    /// Process one detection frame against the active screen's regions.
    ///
    /// Only the first hand with usable thumb and index tips is read.
    pub fn step(&mut self, hands: &[Hand], surface: Surface, regions: &[HitRegion]) -> FrameOutput {
        self.frames += 1;

        let tips = hands.iter()
            .find_map(Hand::fingertips)
            .map(|t| if self.config.mirror { t.mirrored() } else { t });

        let raw = tips.map(|t| surface.denormalize(t.index.x, t.index.y));
        let pointer = self.pointer.update(raw);

        let edge = match tips {
            Some(t) => self.pinch.update(t.thumb, t.index),
            None    => self.pinch.miss(),
        };
        let pinched = self.pinch.is_pressed();

        let hit = pointer.visible_position().and_then(|p| resolve(p, regions));
        let events = self.dispatcher.dispatch(&pointer, edge, pinched, hit);

        trace!(
            "frame {} hands={} edge={:?} hovered={:?}",
            self.frames, hands.len(), edge, hit.map(|r| r.id.as_str())
        );

        FrameOutput {
            pointer,
            edge,
            pinched,
            hovered: hit.map(|r| r.id.clone()),
            events,
            fingertips: tips,
        }
    }

    /// Release any held key; call before tearing down audio.
    pub fn shutdown(&mut self) -> Option<InteractionEvent> {
        self.dispatcher.release_all()
    }

    pub fn config(&self)  -> &PipelineConfig { &self.config }
    pub fn pinch(&self)   -> &PinchDetector { &self.pinch }
    pub fn held(&self)    -> Option<&RegionId> { self.dispatcher.held() }
}

impl Default for GesturePipeline {
    fn default() -> Self { GesturePipeline::new(PipelineConfig::default()) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
