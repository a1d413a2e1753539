//! # pinch_piano
//!
//! Hand-tracked one-octave piano.  The index fingertip drives an on-screen
//! pointer, a thumb-index pinch is the click, and pinching a key plays it
//! over MIDI.  Built on [`hand_pointer`] for the gesture pipeline and
//! [`piano_layout`] for the keyboard, buttons and practice sheets.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Over | Action |
//! |---|---|---|
//! | Pinch | Piano key | Note on; sheet progress advances if it was the expected note |
//! | Open | (anything) | Note off for the held key |
//! | Pinch | `Exit` | Quit |
//! | Pinch | `Select sheet` | Open the sheet popup |
//! | Pinch | Popup item | Start practising that sheet |
//! | Pinch | `Exit sheet` | Back to free play |
//! | Pinch | `Reselect sheet` | Reopen the sheet popup |
//! | Hand lost | | Pointer hides after a few frames; a held note stops |
//!
//! ## Landmark sources
//!
//! * `sim` (default): the mouse is the index fingertip, left button or
//!   `Space` pinches.
//! * `detector`: an external hand-landmark process writes one JSON object
//!   per line on stdout, `{"hands":[{"landmarks":[{"x":..,"y":..},..]}]}`.
//! * `leap`: a LeapMotion controller, with the `leap` feature.
//!
//! ## Feature flags
//!
//! * (default): `sim` and `detector` sources only.
//! * `leap`: polls a real LeapMotion controller via LeapC.
//!
//! ### Keyboard shortcuts
//!
//! | Key | Action |
//! |---|---|
//! | `Space` / left mouse | Pinch (sim source) |
//! | `Q` / `Escape` | Quit |
//!
//! Logging goes through `tracing`; set `RUST_LOG` to override the default
//! filter, e.g. `RUST_LOG=hand_pointer=debug`.

pub mod config;
pub mod error;
pub mod landmarks;
pub mod player;
pub mod visualizer;
pub mod app;

pub use app::{run, AppState, UiState};
pub use config::{AppConfig, DriftSetting, MidiSettings, Settings, SourceKind};
pub use error::SourceError;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "pinch_piano=info,hand_pointer=info,piano_layout=info";

/// Install the global `tracing` subscriber.  `RUST_LOG` wins when set.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(fmt::layer().with_target(true))
        .init();
}
