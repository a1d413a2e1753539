//! Application configuration.
//!
//! An optional JSON file supplies any subset of [`AppConfig`]; the CLI then
//! overrides individual fields.  [`AppConfig::validate`] turns the raw
//! values into [`Settings`], rejecting bad tuning before a window opens.
//!
//! ```json
//! {
//!   "smoothing": 0.4,
//!   "pinch_enter": 0.045,
//!   "source": "detector",
//!   "detector_command": ["python3", "tools/mediapipe_hands.py"],
//!   "sheets": [{ "name": "Scale", "notes": ["C4", "D4", "E4"] }]
//! }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::ValueEnum;
use hand_pointer::{
    DriftPolicy, PinchThresholds, PipelineConfig, SmoothingFactor,
    pinch::{DEFAULT_ENTER, DEFAULT_EXIT},
    pointer::{DEFAULT_MISS_TOLERANCE, DEFAULT_SMOOTHING},
};
use piano_layout::{builtin_sheets, Keyboard, Sheet};
use serde::Deserialize;

// ════════════════════════════════════════════════════════════════════════════
// Enumerated settings
// ════════════════════════════════════════════════════════════════════════════

/// Where hand landmarks come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Mouse over the window; left button or Space pinches.
    #[default]
    Sim,
    /// External detector process printing JSON lines on stdout.
    Detector,
    /// LeapMotion controller (requires the `leap` feature).
    Leap,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DriftSetting {
    #[default]
    Sustain,
    Release,
}

impl From<DriftSetting> for DriftPolicy {
    fn from(d: DriftSetting) -> Self {
        match d {
            DriftSetting::Sustain => DriftPolicy::SustainUntilRelease,
            DriftSetting::Release => DriftPolicy::ReleaseOnDrift,
        }
    }
}

/// Longest the completion popup may stay up.
const MAX_COMPLETE_POPUP_SECS: f32 = 3600.0;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig — raw, as read from file / CLI
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub smoothing:           f32,
    pub pinch_enter:         f32,
    pub pinch_exit:          f32,
    pub miss_tolerance:      u32,
    pub drift:               DriftSetting,
    /// Flip camera input horizontally.  Ignored by the mouse and Leap sources.
    pub mirror:              bool,
    pub source:              SourceKind,
    pub detector_command:    Vec<String>,
    /// General MIDI program, 0 = acoustic grand piano.
    pub midi_program:        u8,
    pub velocity:            u8,
    pub channel:             u8,
    /// Substring of the preferred MIDI output port name.
    pub midi_port:           Option<String>,
    pub fps:                 u32,
    pub complete_popup_secs: f32,
    /// Appended after the built-in sheets.
    pub sheets:              Vec<Sheet>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            smoothing:           DEFAULT_SMOOTHING,
            pinch_enter:         DEFAULT_ENTER,
            pinch_exit:          DEFAULT_EXIT,
            miss_tolerance:      DEFAULT_MISS_TOLERANCE,
            drift:               DriftSetting::default(),
            mirror:              true,
            source:              SourceKind::default(),
            detector_command:    Vec::new(),
            midi_program:        0,
            velocity:            100,
            channel:             0,
            midi_port:           None,
            fps:                 30,
            complete_popup_secs: 5.0,
            sheets:              Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<Settings> {
        let smoothing = SmoothingFactor::new(self.smoothing)?;
        let thresholds = PinchThresholds::new(self.pinch_enter, self.pinch_exit)?;

        if self.midi_program > 127 { bail!("MIDI program {} out of range 0-127", self.midi_program); }
        if self.velocity > 127     { bail!("velocity {} out of range 0-127", self.velocity); }
        if self.channel > 15       { bail!("MIDI channel {} out of range 0-15", self.channel); }
        if !(1..=240).contains(&self.fps) {
            bail!("fps {} out of range 1-240", self.fps);
        }
        if !(0.0..=MAX_COMPLETE_POPUP_SECS).contains(&self.complete_popup_secs) {
            bail!(
                "complete_popup_secs {} out of range 0-{}",
                self.complete_popup_secs, MAX_COMPLETE_POPUP_SECS
            );
        }
        let complete_after = Duration::try_from_secs_f32(self.complete_popup_secs)
            .with_context(|| format!("complete_popup_secs {}", self.complete_popup_secs))?;

        match self.source {
            SourceKind::Detector if self.detector_command.is_empty() => {
                bail!("source \"detector\" needs a detector_command");
            }
            SourceKind::Leap if !cfg!(feature = "leap") => {
                bail!("source \"leap\" needs a build with `--features leap`");
            }
            _ => {}
        }

        let keyboard = Keyboard::one_octave();
        let mut sheets = builtin_sheets();
        for sheet in &self.sheets {
            sheet.validate(&keyboard)
                .with_context(|| format!("configured sheet {:?}", sheet.name))?;
            sheets.push(sheet.clone());
        }

        Ok(Settings {
            pipeline: PipelineConfig {
                smoothing,
                thresholds,
                miss_tolerance: self.miss_tolerance,
                drift_policy:   self.drift.into(),
                mirror:         self.mirror && self.source == SourceKind::Detector,
            },
            sheets,
            complete_after,
            frame_interval: Duration::from_secs_f64(1.0 / self.fps as f64),
            midi: MidiSettings {
                program:  self.midi_program,
                velocity: self.velocity,
                channel:  self.channel,
                port:     self.midi_port.clone(),
            },
            source: self.source,
            detector_command: self.detector_command.clone(),
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Settings — validated
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MidiSettings {
    pub program:  u8,
    pub velocity: u8,
    pub channel:  u8,
    pub port:     Option<String>,
}

impl Default for MidiSettings {
    fn default() -> Self {
        MidiSettings { program: 0, velocity: 100, channel: 0, port: None }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub pipeline:         PipelineConfig,
    /// Built-ins first, then configured extras.
    pub sheets:           Vec<Sheet>,
    pub complete_after:   Duration,
    pub frame_interval:   Duration,
    pub midi:             MidiSettings,
    pub source:           SourceKind,
    pub detector_command: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            pipeline:         PipelineConfig::default(),
            sheets:           builtin_sheets(),
            complete_after:   Duration::from_secs(5),
            frame_interval:   Duration::from_millis(33),
            midi:             MidiSettings::default(),
            source:           SourceKind::default(),
            detector_command: Vec::new(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
