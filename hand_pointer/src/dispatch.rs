//! Interaction dispatcher — pinch edges plus hit results become UI events.
//!
//! | Input | Held key | Output |
//! |---|---|---|
//! | `Pressed` edge over a key | none | `KeyPress(id)`, key becomes held |
//! | `Pressed` edge over a button | none | `ButtonActivate(id)` |
//! | `Pressed` edge over nothing | none | — |
//! | `Released` edge | `id` | `KeyRelease(id)`, nothing held |
//! | still pinched, pointer off held key | `id` | depends on [`DriftPolicy`] |
//!
//! The only state is the held key id.

use tracing::debug;

use crate::hit_test::{HitRegion, RegionId};
use crate::pinch::PinchEdge;
use crate::pointer::PointerState;

/// What happens when the pointer leaves the held key while still pinched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriftPolicy {
    /// Keep the note sounding until the pinch opens.
    #[default]
    SustainUntilRelease,
    /// Stop the note as soon as the pointer leaves its key.
    ReleaseOnDrift,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionEvent {
    KeyPress(RegionId),
    KeyRelease(RegionId),
    ButtonActivate(RegionId),
}

#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    policy: DriftPolicy,
    held:   Option<RegionId>,
}

impl Dispatcher {
    pub fn new(policy: DriftPolicy) -> Self {
        Dispatcher { policy, held: None }
    }

    /// Consume one frame's pointer, pinch edge and hit result.
    ///
    /// `pinched` is the detector's current state; it only matters for the
    /// drift check on frames without an edge.
    pub fn dispatch(
        &mut self,
        pointer: &PointerState,
        edge:    PinchEdge,
        pinched: bool,
        hit:     Option<&HitRegion>,
    ) -> Vec<InteractionEvent> {
        let mut out = Vec::new();

        match edge {
            PinchEdge::Pressed => {
                // A second press without a release would orphan the first note.
                if let Some(id) = self.held.take() {
                    out.push(InteractionEvent::KeyRelease(id));
                }
                if !pointer.visible {
                    return self.log(out);
                }
                match hit {
                    Some(region) if region.kind.is_key() => {
                        self.held = Some(region.id.clone());
                        out.push(InteractionEvent::KeyPress(region.id.clone()));
                    }
                    Some(region) => {
                        out.push(InteractionEvent::ButtonActivate(region.id.clone()));
                    }
                    None => {}
                }
            }
            PinchEdge::Released => {
                if let Some(id) = self.held.take() {
                    out.push(InteractionEvent::KeyRelease(id));
                }
            }
            PinchEdge::None => {
                if pinched && self.policy == DriftPolicy::ReleaseOnDrift {
                    let still_on_key = match (&self.held, hit) {
                        (Some(id), Some(region)) => &region.id == id,
                        _ => false,
                    };
                    if !still_on_key {
                        if let Some(id) = self.held.take() {
                            out.push(InteractionEvent::KeyRelease(id));
                        }
                    }
                }
            }
        }

        self.log(out)
    }

    /// Release whatever is held, e.g. on shutdown.
    pub fn release_all(&mut self) -> Option<InteractionEvent> {
        self.held.take().map(InteractionEvent::KeyRelease)
    }

    pub fn held(&self) -> Option<&RegionId> { self.held.as_ref() }
    pub fn policy(&self) -> DriftPolicy { self.policy }

    fn log(&self, events: Vec<InteractionEvent>) -> Vec<InteractionEvent> {
        for e in &events {
            debug!("dispatch {:?}", e);
        }
        events
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
