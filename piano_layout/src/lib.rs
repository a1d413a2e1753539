//! # piano_layout
//!
//! Static geometry for the pinch piano: a one-octave keyboard, the buttons
//! shown in each mode, the sheet-selection popup, and guided sheet play.
//!
//! Everything here is plain data.  [`Layout::regions`] turns the current
//! [`Mode`] into the ordered [`hand_pointer::HitRegion`] list the gesture
//! pipeline resolves against.
//!
//! ```rust
//! use piano_layout::{builtin_sheets, Layout, Mode};
//!
//! let layout = Layout::new(&builtin_sheets());
//! assert_eq!(layout.regions(Mode::Normal).len(), 13 + 2);
//! assert_eq!(layout.keyboard().midi_for("C4"), Some(60));
//! ```

pub mod error;
pub mod keyboard;
pub mod screen;
pub mod sheet;

pub use error::LayoutError;
pub use keyboard::{Keyboard, PianoKey};
pub use screen::{Button, Layout, Mode, Popup, UiAction, MAX_POPUP_ITEMS};
pub use sheet::{builtin_sheets, NoteOutcome, Sheet, SheetProgress};

pub const SCREEN_W: u32 = 1280;
pub const SCREEN_H: u32 = 720;
