//! One-octave keyboard, C4 through C5.
//!
//! | Slot | 0 | 1 | 2 | 3 | 4 | 5 | 6 | 7 |
//! |---|---|---|---|---|---|---|---|---|
//! | White | C4 | D4 | E4 | F4 | G4 | A4 | B4 | C5 |
//! | Black after | C#4 | D#4 | | F#4 | G#4 | A#4 | | |
//!
//! White keys tile the bottom third of the surface; each black key is
//! centred on the boundary after white keys 0, 1, 3, 4 and 5.

use hand_pointer::{HitRegion, Rect, RegionKind};

use crate::{SCREEN_H, SCREEN_W};

// ════════════════════════════════════════════════════════════════════════════
// Note table
// ════════════════════════════════════════════════════════════════════════════

/// (name, MIDI note, frequency Hz, is_black)
const NOTES: [(&str, u8, f32, bool); 13] = [
    ("C4",  60, 261.63, false),
    ("C#4", 61, 277.18, true),
    ("D4",  62, 293.66, false),
    ("D#4", 63, 311.13, true),
    ("E4",  64, 329.63, false),
    ("F4",  65, 349.23, false),
    ("F#4", 66, 369.99, true),
    ("G4",  67, 392.00, false),
    ("G#4", 68, 415.30, true),
    ("A4",  69, 440.00, false),
    ("A#4", 70, 466.16, true),
    ("B4",  71, 493.88, false),
    ("C5",  72, 523.25, false),
];

/// White-key slot each black key sits after.
const BLACK_AFTER_WHITE: [usize; 5] = [0, 1, 3, 4, 5];

const WHITE_KEY_W: f32 = 80.0;
const BLACK_KEY_W: f32 = 50.0;
const KEY_TOP_MARGIN: f32 = 10.0;
const KEY_BOTTOM_MARGIN: f32 = 10.0;

// ════════════════════════════════════════════════════════════════════════════
// PianoKey
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct PianoKey {
    pub note:      &'static str,
    pub midi:      u8,
    pub frequency: f32,
    pub is_black:  bool,
    pub rect:      Rect,
}

impl PianoKey {
    pub fn kind(&self) -> RegionKind {
        if self.is_black { RegionKind::BlackKey } else { RegionKind::WhiteKey }
    }

    pub fn region(&self) -> HitRegion {
        HitRegion::new(self.note, self.kind(), self.rect)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Keyboard
// ════════════════════════════════════════════════════════════════════════════

/// Keys in drawing order: all white keys left to right, then black keys.
#[derive(Clone, Debug)]
pub struct Keyboard {
    keys: Vec<PianoKey>,
}

impl Keyboard {
    pub fn one_octave() -> Self {
        let band_top = (SCREEN_H * 2 / 3) as f32;
        let band_h = SCREEN_H as f32 - band_top;
        let white_h = band_h - KEY_TOP_MARGIN - KEY_BOTTOM_MARGIN;
        let black_h = (white_h * 0.6).floor();
        let top = band_top + KEY_TOP_MARGIN;

        let white_count = NOTES.iter().filter(|n| !n.3).count();
        let start_x = ((SCREEN_W as f32 - white_count as f32 * WHITE_KEY_W) / 2.0).floor();

        let mut keys = Vec::with_capacity(NOTES.len());

        let whites = NOTES.iter().filter(|n| !n.3);
        for (slot, &(note, midi, frequency, _)) in whites.enumerate() {
            let x = start_x + slot as f32 * WHITE_KEY_W;
            keys.push(PianoKey {
                note, midi, frequency,
                is_black: false,
                rect: Rect::from_xywh(x, top, WHITE_KEY_W, white_h),
            });
        }

        let blacks = NOTES.iter().filter(|n| n.3);
        for (&(note, midi, frequency, _), &slot) in blacks.zip(BLACK_AFTER_WHITE.iter()) {
            let x = start_x + (slot + 1) as f32 * WHITE_KEY_W - (BLACK_KEY_W / 2.0).floor();
            keys.push(PianoKey {
                note, midi, frequency,
                is_black: true,
                rect: Rect::from_xywh(x, top, BLACK_KEY_W, black_h),
            });
        }

        Keyboard { keys }
    }

    pub fn keys(&self) -> &[PianoKey] { &self.keys }

    pub fn key(&self, note: &str) -> Option<&PianoKey> {
        self.keys.iter().find(|k| k.note == note)
    }

    pub fn midi_for(&self, note: &str) -> Option<u8> {
        self.key(note).map(|k| k.midi)
    }

    pub fn white_keys(&self) -> impl Iterator<Item = &PianoKey> {
        self.keys.iter().filter(|k| !k.is_black)
    }

    pub fn black_keys(&self) -> impl Iterator<Item = &PianoKey> {
        self.keys.iter().filter(|k| k.is_black)
    }

    pub fn regions(&self) -> impl Iterator<Item = HitRegion> + '_ {
        self.keys.iter().map(PianoKey::region)
    }
}

impl Default for Keyboard {
    fn default() -> Self { Keyboard::one_octave() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pointer::{resolve, Point};

    #[test]
    fn thirteen_keys_eight_white() {
        let kb = Keyboard::one_octave();
        assert_eq!(kb.keys().len(), 13);
        assert_eq!(kb.white_keys().count(), 8);
        assert_eq!(kb.black_keys().count(), 5);
    }

    #[test]
    fn white_key_geometry() {
        let kb = Keyboard::one_octave();
        let c4 = kb.key("C4").unwrap();
        assert_eq!(c4.rect, Rect::from_xywh(320.0, 490.0, 80.0, 220.0));
        let c5 = kb.key("C5").unwrap();
        assert_eq!(c5.rect.left, 320.0 + 7.0 * 80.0);
    }

    #[test]
    fn black_key_geometry() {
        let kb = Keyboard::one_octave();
        let cs = kb.key("C#4").unwrap();
        assert_eq!(cs.rect, Rect::from_xywh(375.0, 490.0, 50.0, 132.0));
        let as4 = kb.key("A#4").unwrap();
        assert_eq!(as4.rect.left, 320.0 + 6.0 * 80.0 - 25.0);
    }

    #[test]
    fn midi_numbers_are_chromatic() {
        let kb = Keyboard::one_octave();
        let mut midis: Vec<u8> = kb.keys().iter().map(|k| k.midi).collect();
        midis.sort_unstable();
        assert_eq!(midis, (60..=72).collect::<Vec<u8>>());
        assert_eq!(kb.midi_for("A4"), Some(69));
        assert_eq!(kb.midi_for("H4"), None);
    }

    #[test]
    fn every_black_key_wins_over_whites_beneath() {
        let kb = Keyboard::one_octave();
        let regions: Vec<_> = kb.regions().collect();
        for black in kb.black_keys() {
            let c = black.rect.center();
            for p in [c, Point::new(black.rect.left + 1.0, c.y), Point::new(black.rect.right - 1.0, c.y)] {
                assert_eq!(resolve(p, &regions).unwrap().id.as_str(), black.note);
            }
        }
    }

    #[test]
    fn white_key_lower_half_unobstructed() {
        let kb = Keyboard::one_octave();
        let regions: Vec<_> = kb.regions().collect();
        for white in kb.white_keys() {
            let p = Point::new(white.rect.center().x, white.rect.bottom - 20.0);
            assert_eq!(resolve(p, &regions).unwrap().id.as_str(), white.note);
        }
    }
}
