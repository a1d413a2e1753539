//! Hand landmarks as delivered by an external detector.
//!
//! Detectors report each hand as an ordered list of normalized positions
//! (MediaPipe's 21-point convention).  The pipeline reads exactly two of
//! them: the thumb tip and the index fingertip.

use serde::Deserialize;

/// Landmark indices (MediaPipe hand model).
pub mod index {
    pub const THUMB_TIP:        usize = 4;
    pub const INDEX_FINGER_TIP: usize = 8;
    /// Total landmarks per hand in a complete detection.
    pub const COUNT:            usize = 21;
}

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

/// One detector-estimated point on the hand, normalized to the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct Landmark {
    /// 0.0–1.0 across the frame width.
    pub x: f32,
    /// 0.0–1.0 down the frame height.
    pub y: f32,
    /// Relative depth; read by nothing in the pipeline.
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self { Landmark { x, y, z: 0.0 } }

    /// Planar distance in normalized units.
    pub fn distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Flip horizontally, matching a mirrored camera view.
    pub fn mirrored(self) -> Self {
        Landmark { x: 1.0 - self.x, ..self }
    }

    /// Finite and inside the unit square.
    pub fn in_range(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
            && (0.0..=1.0).contains(&self.x)
            && (0.0..=1.0).contains(&self.y)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Hand
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Handedness { Left, Right }

/// A single detected hand.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Hand {
    #[serde(default)]
    pub handedness: Option<Handedness>,
    pub landmarks:  Vec<Landmark>,
}

/// The two points the pipeline consumes from a hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fingertips {
    pub thumb: Landmark,
    pub index: Landmark,
}

impl Fingertips {
    pub fn pinch_distance(&self) -> f32 { self.thumb.distance(&self.index) }

    pub fn mirrored(self) -> Self {
        Fingertips { thumb: self.thumb.mirrored(), index: self.index.mirrored() }
    }
}

impl Hand {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Hand { handedness: None, landmarks }
    }

    /// Thumb and index tips, or `None` when the hand is too short or either
    /// point is out of range.  Malformed hands count as "no hand".
    pub fn fingertips(&self) -> Option<Fingertips> {
        let thumb = *self.landmarks.get(index::THUMB_TIP)?;
        let index_tip = *self.landmarks.get(index::INDEX_FINGER_TIP)?;
        if !thumb.in_range() || !index_tip.in_range() {
            return None;
        }
        Some(Fingertips { thumb, index: index_tip })
    }
}

/// Build a full 21-point hand with only the thumb and index tips placed;
/// every other landmark sits on the index tip.  Used by simulated sources.
pub fn synthetic_hand(thumb: Landmark, index_tip: Landmark) -> Hand {
    let mut landmarks = vec![index_tip; index::COUNT];
    landmarks[index::THUMB_TIP] = thumb;
    Hand::new(landmarks)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
