//! Sheets and guided-play progress.
//!
//! A sheet is a name and an ordered list of note names.  While one is being
//! played, [`SheetProgress`] tracks the next expected note: pressing it
//! advances, pressing anything else just sounds.

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::LayoutError;
use crate::keyboard::Keyboard;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Sheet {
    pub name:  String,
    pub notes: Vec<String>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, notes: &[&str]) -> Self {
        Sheet {
            name:  name.into(),
            notes: notes.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Every note must exist on `keyboard`, and there must be at least one.
    pub fn validate(&self, keyboard: &Keyboard) -> Result<(), LayoutError> {
        if self.notes.is_empty() {
            return Err(LayoutError::EmptySheet { sheet: self.name.clone() });
        }
        for (position, note) in self.notes.iter().enumerate() {
            if keyboard.key(note).is_none() {
                return Err(LayoutError::UnknownNote {
                    sheet: self.name.clone(),
                    position,
                    note: note.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize { self.notes.len() }
    pub fn is_empty(&self) -> bool { self.notes.is_empty() }
}

pub fn builtin_sheets() -> Vec<Sheet> {
    vec![
        Sheet::new("Twinkle Twinkle", &[
            "C4", "C4", "G4", "G4", "A4", "A4", "G4",
            "F4", "F4", "E4", "E4", "D4", "D4", "C4",
        ]),
        Sheet::new("Ode to Joy", &[
            "E4", "E4", "F4", "G4", "G4", "F4", "E4", "D4",
            "C4", "C4", "D4", "E4", "E4", "D4", "D4",
        ]),
        Sheet::new("Simple Practice", &["C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5"]),
    ]
}

// ════════════════════════════════════════════════════════════════════════════
// Progress
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteOutcome {
    /// Wrong note; it still sounds.
    Ignored,
    Advanced,
    /// The last expected note was just played.
    Completed,
}

#[derive(Clone, Debug)]
pub struct SheetProgress {
    sheet: Sheet,
    index: usize,
}

impl SheetProgress {
    pub fn new(sheet: Sheet) -> Self {
        info!("sheet {:?} started ({} notes)", sheet.name, sheet.len());
        SheetProgress { sheet, index: 0 }
    }

    pub fn sheet(&self) -> &Sheet { &self.sheet }
    pub fn index(&self) -> usize { self.index }
    pub fn is_complete(&self) -> bool { self.index >= self.sheet.len() }

    pub fn expected(&self) -> Option<&str> {
        self.sheet.notes.get(self.index).map(String::as_str)
    }

    pub fn register(&mut self, note: &str) -> NoteOutcome {
        match self.expected() {
            Some(want) if want == note => {
                self.index += 1;
                if self.is_complete() {
                    info!("sheet {:?} complete", self.sheet.name);
                    NoteOutcome::Completed
                } else {
                    debug!("sheet {:?} {}/{}", self.sheet.name, self.index, self.sheet.len());
                    NoteOutcome::Advanced
                }
            }
            _ => NoteOutcome::Ignored,
        }
    }

    /// "name: done/total", as shown in the status bar.
    pub fn label(&self) -> String {
        format!("{}: {}/{}", self.sheet.name, self.index, self.sheet.len())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
