//! # hand_pointer
//!
//! Turns per-frame hand landmarks into a stable on-screen pointer and a
//! debounced click, then resolves that pointer against the active screen's
//! interactive regions.
//!
//! ## Pipeline
//!
//! | Stage | Input | Output |
//! |---|---|---|
//! | [`pointer::PointerFilter`] | index fingertip (pixels) or none | smoothed position, visibility |
//! | [`pinch::PinchDetector`] | thumb tip + index tip | `Pressed` / `Released` edges |
//! | [`hit_test::resolve`] | pointer + ordered regions | highest-tier region under the pointer |
//! | [`dispatch::Dispatcher`] | pointer, edge, hit | `KeyPress`, `KeyRelease`, `ButtonActivate` |
//!
//! [`pipeline::GesturePipeline`] owns all of it and runs one frame at a time.
//!
//! ## Quick start
//!
//! ```rust
//! use hand_pointer::{
//!     GesturePipeline, PipelineConfig, HitRegion, RegionKind, Rect, Surface,
//!     InteractionEvent, synthetic_hand, Landmark,
//! };
//!
//! let mut pipeline = GesturePipeline::new(PipelineConfig::default());
//! let surface = Surface::new(1280, 720).unwrap();
//! let regions = vec![
//!     HitRegion::new("C4", RegionKind::WhiteKey, Rect::from_xywh(320.0, 490.0, 80.0, 220.0)),
//! ];
//!
//! // Index tip over the key, thumb touching it: a pinch.
//! let tip = Landmark::new(360.0 / 1280.0, 600.0 / 720.0);
//! let hand = synthetic_hand(Landmark::new(tip.x + 0.01, tip.y), tip);
//! let out = pipeline.step(&[hand], surface, &regions);
//! assert_eq!(out.events, vec![InteractionEvent::KeyPress("C4".into())]);
//! ```

pub mod error;
pub mod geometry;
pub mod landmark;
pub mod pointer;
pub mod pinch;
pub mod hit_test;
pub mod dispatch;
pub mod pipeline;

pub use dispatch::{Dispatcher, DriftPolicy, InteractionEvent};
pub use error::ConfigError;
pub use geometry::{Point, Polygon, Rect, Shape, Surface};
pub use hit_test::{resolve, HitRegion, RegionId, RegionKind, Tier};
pub use landmark::{synthetic_hand, Fingertips, Hand, Handedness, Landmark};
pub use pinch::{ClickState, PinchDetector, PinchEdge, PinchThresholds};
pub use pipeline::{FrameOutput, GesturePipeline, PipelineConfig};
pub use pointer::{PointerFilter, PointerState, SmoothingFactor};
