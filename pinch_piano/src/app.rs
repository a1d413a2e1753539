//! Top-level application state machine.
//!
//! `AppState` owns the gesture pipeline, the screen layout, the current
//! mode and sheet progress, and the note sink.  Each fresh detection goes
//! through [`AppState::handle_frame`]; [`AppState::tick`] runs once per
//! rendered frame for timeouts.
//!
//! | From | Trigger | To |
//! |---|---|---|
//! | `Normal` | Select sheet | `SheetSelect` |
//! | `SheetPlay` | Reselect sheet | `SheetSelect` |
//! | `SheetSelect` | pinch a sheet | `SheetPlay` |
//! | `SheetPlay` | Exit sheet | `Normal` |
//! | `SheetPlay` | last expected note | `Complete` |
//! | `Complete` | popup timeout | `Normal` |

use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use hand_pointer::{
    ConfigError, FrameOutput, GesturePipeline, Hand, InteractionEvent, PinchEdge, RegionId,
    Surface,
};
use piano_layout::{
    Layout, LayoutError, Mode, NoteOutcome, Sheet, SheetProgress, UiAction, SCREEN_H, SCREEN_W,
};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, Settings, SourceKind};
use crate::landmarks::{
    spawn_landmark_source, JsonLinesSource, LandmarkFeed, SimInput, SimLandmarkSource,
};
use crate::player::{NoteSink, Player};
use crate::visualizer::Visualizer;

/// How long a clicked button stays drawn as active.
const BUTTON_FLASH: Duration = Duration::from_millis(150);

// ════════════════════════════════════════════════════════════════════════════
// UiState — per-region visual state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiState { Normal, Hover, Active }

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── gesture → region ──────────────────────────────────────────────────
    pipeline: GesturePipeline,
    layout:   Layout,
    surface:  Surface,
    last:     Option<FrameOutput>,

    // ── mode / sheet ──────────────────────────────────────────────────────
    mode:           Mode,
    sheets:         Vec<Sheet>,
    progress:       Option<SheetProgress>,
    complete_since: Option<Instant>,
    complete_after: Duration,

    // ── sound ─────────────────────────────────────────────────────────────
    sink:     Box<dyn NoteSink>,
    sounding: Option<(RegionId, u8)>,

    // ── feedback ──────────────────────────────────────────────────────────
    flash:      Option<(RegionId, Instant)>,
    pub status: String,
    quit:       bool,
}

impl AppState {
    pub fn new(settings: &Settings, sink: Box<dyn NoteSink>) -> Result<Self, ConfigError> {
        Ok(AppState {
            pipeline: GesturePipeline::new(settings.pipeline),
            layout:   Layout::new(&settings.sheets),
            surface:  Surface::new(SCREEN_W, SCREEN_H)?,
            last:     None,
            mode:           Mode::Normal,
            sheets:         settings.sheets.clone(),
            progress:       None,
            complete_since: None,
            complete_after: settings.complete_after,
            sink,
            sounding: None,
            flash:    None,
            status:   "Ready: point with your index finger, pinch to play".to_string(),
            quit:     false,
        })
    }

    // ── one detection frame ───────────────────────────────────────────────

    pub fn handle_frame(&mut self, hands: &[Hand], now: Instant) {
        let regions = self.layout.regions(self.mode);
        let out = self.pipeline.step(hands, self.surface, &regions);
        for event in &out.events {
            self.handle_event(event, now);
        }
        self.last = Some(out);
    }

    fn handle_event(&mut self, event: &InteractionEvent, now: Instant) {
        match event {
            InteractionEvent::KeyPress(id) => self.press_key(id, now),

            InteractionEvent::KeyRelease(id) => {
                if let Some((held, midi)) = self.sounding.take() {
                    if &held == id {
                        self.sink.note_off(midi);
                    } else {
                        warn!("release of {} while {} sounding", id, held);
                        self.sounding = Some((held, midi));
                    }
                }
            }

            InteractionEvent::ButtonActivate(id) => {
                self.flash = Some((id.clone(), now));
                match self.layout.action_for(self.mode, id) {
                    Some(action) => self.apply(action),
                    None         => debug!("{} has no action in {:?}", id, self.mode),
                }
            }
        }
    }

    fn press_key(&mut self, id: &RegionId, now: Instant) {
        let Some(key) = self.layout.keyboard().key(id.as_str()) else {
            warn!("key {} is not on the keyboard", id);
            return;
        };
        let (midi, hz) = (key.midi, key.frequency);
        self.sink.note_on(midi);
        self.sounding = Some((id.clone(), midi));
        self.status = format!("{}  note {}  {:.1} Hz", id, midi, hz);

        if self.mode != Mode::SheetPlay { return; }
        let Some(progress) = self.progress.as_mut() else { return };
        match progress.register(id.as_str()) {
            NoteOutcome::Advanced  => self.status = progress.label(),
            NoteOutcome::Ignored   => {}
            NoteOutcome::Completed => {
                self.status = format!("Completed {}!", progress.sheet().name);
                self.set_mode(Mode::Complete);
                self.complete_since = Some(now);
            }
        }
    }

    fn apply(&mut self, action: UiAction) {
        info!("action {:?}", action);
        match action {
            UiAction::ExitApp => {
                self.status = "Exiting".to_string();
                self.quit = true;
            }
            UiAction::OpenSheetSelect => {
                self.status = "Pinch a sheet to play it".to_string();
                self.set_mode(Mode::SheetSelect);
            }
            UiAction::ExitSheetMode => self.leave_sheet(),
            UiAction::SelectSheet(i) => match self.sheets.get(i).cloned().ok_or(LayoutError::NoSuchSheet(i)) {
                Ok(sheet) => {
                    let progress = SheetProgress::new(sheet);
                    self.status = progress.label();
                    self.progress = Some(progress);
                    self.set_mode(Mode::SheetPlay);
                }
                Err(e) => warn!("{}", e),
            },
        }
    }

    fn leave_sheet(&mut self) {
        self.progress = None;
        self.complete_since = None;
        self.status = "Free play".to_string();
        self.set_mode(Mode::Normal);
    }

    fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            info!("mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    // ── per rendered frame ────────────────────────────────────────────────

    pub fn tick(&mut self, now: Instant) {
        if let Some(since) = self.complete_since {
            if self.mode == Mode::Complete && now.saturating_duration_since(since) >= self.complete_after {
                self.leave_sheet();
            }
        }
        let flash_done = self.flash.as_ref()
            .map_or(false, |(_, at)| now.saturating_duration_since(*at) >= BUTTON_FLASH);
        if flash_done {
            self.flash = None;
        }
    }

    /// Release any sounding note before audio goes away.
    pub fn shutdown(&mut self) {
        if let Some(event) = self.pipeline.shutdown() {
            self.handle_event(&event, Instant::now());
        }
        if let Some((_, midi)) = self.sounding.take() {
            self.sink.note_off(midi);
        }
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn mode(&self)            -> Mode                  { self.mode }
    pub fn layout(&self)          -> &Layout               { &self.layout }
    pub fn progress(&self)        -> Option<&SheetProgress> { self.progress.as_ref() }
    pub fn last_frame(&self)      -> Option<&FrameOutput>  { self.last.as_ref() }
    pub fn quit_requested(&self)  -> bool                  { self.quit }

    pub fn expected_note(&self) -> Option<&str> {
        match self.mode {
            Mode::SheetPlay => self.progress.as_ref().and_then(SheetProgress::expected),
            _               => None,
        }
    }

    /// Thumb-index distance from the latest detection, normalized units.
    pub fn pinch_distance(&self) -> Option<f32> {
        self.pipeline.pinch().last_distance()
    }

    /// Active only for the held key, a flashing button, or the region a
    /// press landed on this frame; sliding a pinch onto a region is Hover.
    pub fn ui_state(&self, id: &RegionId) -> UiState {
        let held    = self.pipeline.held() == Some(id);
        let flashed = self.flash.as_ref().map_or(false, |(f, _)| f == id);
        let (hovered, pressed_here) = match &self.last {
            Some(f) => {
                let hovered = f.hovered.as_ref() == Some(id);
                (hovered, hovered && f.edge == PinchEdge::Pressed)
            }
            None => (false, false),
        };
        if held || flashed || pressed_here {
            UiState::Active
        } else if hovered {
            UiState::Hover
        } else {
            UiState::Normal
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// The sim source also hands back the sender the window feeds it through.
fn open_source(settings: &Settings) -> anyhow::Result<(Option<mpsc::Sender<SimInput>>, LandmarkFeed)> {
    Ok(match settings.source {
        SourceKind::Sim => {
            let (tx, rx) = mpsc::channel();
            (Some(tx), spawn_landmark_source(SimLandmarkSource { rx }))
        }
        SourceKind::Detector => {
            let command = settings.detector_command.clone();
            (None, spawn_landmark_source(JsonLinesSource { command }))
        }
        #[cfg(feature = "leap")]
        SourceKind::Leap => (None, spawn_landmark_source(crate::landmarks::LeapSource)),
        #[cfg(not(feature = "leap"))]
        SourceKind::Leap => return Err(anyhow!("built without the `leap` feature")),
    })
}

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It opens the landmark
/// source, the MIDI player and the window, then renders at the configured
/// frame rate, stepping the pipeline whenever a fresh detection arrives.
pub fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let settings = cfg.validate()?;
    let (sim_tx, feed) = open_source(&settings)?;
    info!("landmark source: {}", feed.name());

    let mut vis = Visualizer::new(sim_tx, settings.frame_interval)
        .map_err(|e| anyhow!("opening window: {}", e))?;

    let player = Player::spawn(settings.midi.clone());
    let mut app = AppState::new(&settings, Box::new(player))?;
    let mut source_lost = false;

    while vis.is_open() {
        // 1. Window input (feeds the sim source when active)
        if !vis.poll_input() { break; }

        // 2. Newest detection, if any arrived since the last frame
        let now = Instant::now();
        if let Some(hands) = feed.take() {
            app.handle_frame(&hands, now);
        } else if feed.is_closed() {
            // Keep stepping so the pointer hides and held notes release.
            if !source_lost {
                warn!("{} source stopped; no more hand input", feed.name());
                app.status = format!("{} source stopped", feed.name());
                source_lost = true;
            }
            app.handle_frame(&[], now);
        }

        // 3. Timeouts
        app.tick(now);
        if app.quit_requested() { break; }

        // 4. Render
        vis.render(&app);
    }

    app.shutdown();
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pointer::{synthetic_hand, Landmark, PipelineConfig, SmoothingFactor};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Note { On(u8), Off(u8) }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Note>>>);

    impl NoteSink for Recorder {
        fn note_on(&mut self, n: u8)  { self.0.lock().push(Note::On(n)); }
        fn note_off(&mut self, n: u8) { self.0.lock().push(Note::Off(n)); }
    }

    fn settings(sheets: Vec<Sheet>) -> Settings {
        Settings {
            pipeline: PipelineConfig {
                smoothing: SmoothingFactor::new(1.0).unwrap(),
                ..PipelineConfig::default()
            },
            sheets,
            ..Settings::default()
        }
    }

    fn make_app_with(sheets: Vec<Sheet>) -> (AppState, Arc<Mutex<Vec<Note>>>) {
        let rec = Recorder::default();
        let log = rec.0.clone();
        (AppState::new(&settings(sheets), Box::new(rec)).unwrap(), log)
    }

    fn make_app() -> (AppState, Arc<Mutex<Vec<Note>>>) {
        make_app_with(piano_layout::builtin_sheets())
    }

    fn hand(px: f32, py: f32, pinched: bool) -> Vec<Hand> {
        let tip = Landmark::new(px / SCREEN_W as f32, py / SCREEN_H as f32);
        let gap = if pinched { 0.01 } else { 0.15 };
        let thumb_y = if tip.y > 0.5 { tip.y - gap } else { tip.y + gap };
        vec![synthetic_hand(Landmark::new(tip.x, thumb_y), tip)]
    }

    /// Hover, pinch, open at one spot.
    fn click(app: &mut AppState, px: f32, py: f32, now: Instant) {
        app.handle_frame(&hand(px, py, false), now);
        app.handle_frame(&hand(px, py, true), now);
        app.handle_frame(&hand(px, py, false), now);
    }

    const SELECT_BUTTON:  (f32, f32) = (265.0, 40.0);
    const EXIT_BUTTON:    (f32, f32) = (95.0, 40.0);
    const EXIT_SHEET:     (f32, f32) = (120.0, 40.0);

    fn popup_item(i: usize) -> (f32, f32) { (640.0, 315.0 + 60.0 * i as f32) }

    fn key_center(app: &AppState, note: &str) -> (f32, f32) {
        let c = app.layout().keyboard().key(note).unwrap().rect.center();
        (c.x, c.y)
    }

    /// Lower half of a white key, clear of black keys.
    fn white_key(app: &AppState, note: &str) -> (f32, f32) {
        let r = app.layout().keyboard().key(note).unwrap().rect;
        (r.center().x, r.bottom - 30.0)
    }

    #[test]
    fn free_play_sounds_and_stops_note() {
        let (mut app, log) = make_app();
        let now = Instant::now();
        let (x, y) = white_key(&app, "C4");
        app.handle_frame(&hand(x, y, false), now);
        app.handle_frame(&hand(x, y, true), now);
        assert_eq!(*log.lock(), vec![Note::On(60)]);
        assert_eq!(app.ui_state(&"C4".into()), UiState::Active);
        app.handle_frame(&hand(x, y, false), now);
        assert_eq!(*log.lock(), vec![Note::On(60), Note::Off(60)]);
        assert_eq!(app.ui_state(&"C4".into()), UiState::Hover);
    }

    #[test]
    fn sliding_pinch_lights_only_the_held_key() {
        let (mut app, log) = make_app();
        let now = Instant::now();
        let (cx, cy) = white_key(&app, "C4");
        let (dx, dy) = white_key(&app, "D4");
        app.handle_frame(&hand(cx, cy, false), now);
        app.handle_frame(&hand(cx, cy, true), now);
        app.handle_frame(&hand(dx, dy, true), now);

        assert_eq!(*log.lock(), vec![Note::On(60)]);
        assert_eq!(app.ui_state(&"C4".into()), UiState::Active);
        assert_eq!(app.ui_state(&"D4".into()), UiState::Hover);
    }

    #[test]
    fn status_shows_frequency_and_pinch_distance() {
        use approx::assert_relative_eq;

        let (mut app, _log) = make_app();
        assert!(app.pinch_distance().is_none());
        let (x, y) = white_key(&app, "A4");
        click(&mut app, x, y, Instant::now());
        assert!(app.status.contains("440.0 Hz"), "{}", app.status);
        assert_relative_eq!(app.pinch_distance().unwrap(), 0.15, epsilon = 1e-4);
    }

    #[test]
    fn black_key_plays_sharp() {
        let (mut app, log) = make_app();
        let (x, y) = key_center(&app, "F#4");
        click(&mut app, x, y, Instant::now());
        assert_eq!(*log.lock(), vec![Note::On(66), Note::Off(66)]);
    }

    #[test]
    fn select_sheet_through_popup() {
        let (mut app, log) = make_app();
        let now = Instant::now();
        click(&mut app, SELECT_BUTTON.0, SELECT_BUTTON.1, now);
        assert_eq!(app.mode(), Mode::SheetSelect);

        // Keys are covered by the modal popup.
        let (x, y) = white_key(&app, "C4");
        click(&mut app, x, y, now);
        assert!(log.lock().is_empty());

        let (x, y) = popup_item(2);
        click(&mut app, x, y, now);
        assert_eq!(app.mode(), Mode::SheetPlay);
        assert_eq!(app.progress().unwrap().sheet().name, "Simple Practice");
        assert_eq!(app.expected_note(), Some("C4"));
    }

    #[test]
    fn sheet_play_completes_and_times_out() {
        let (mut app, log) = make_app_with(vec![Sheet::new("Two", &["C4", "D4"])]);
        let t0 = Instant::now();
        click(&mut app, SELECT_BUTTON.0, SELECT_BUTTON.1, t0);
        let (x, y) = popup_item(0);
        click(&mut app, x, y, t0);
        assert_eq!(app.mode(), Mode::SheetPlay);

        // Wrong note sounds but does not advance.
        let (x, y) = white_key(&app, "E4");
        click(&mut app, x, y, t0);
        assert_eq!(app.progress().unwrap().index(), 0);

        let (x, y) = white_key(&app, "C4");
        click(&mut app, x, y, t0);
        assert_eq!(app.expected_note(), Some("D4"));

        let (x, y) = white_key(&app, "D4");
        click(&mut app, x, y, t0);
        assert_eq!(app.mode(), Mode::Complete);
        assert_eq!(app.expected_note(), None);
        assert_eq!(
            *log.lock(),
            vec![Note::On(64), Note::Off(64), Note::On(60), Note::Off(60), Note::On(62), Note::Off(62)]
        );

        app.tick(t0 + Duration::from_secs(4));
        assert_eq!(app.mode(), Mode::Complete);
        app.tick(t0 + Duration::from_secs(5));
        assert_eq!(app.mode(), Mode::Normal);
        assert!(app.progress().is_none());
    }

    #[test]
    fn complete_mode_has_no_regions() {
        let (mut app, _log) = make_app_with(vec![Sheet::new("One", &["C4"])]);
        let t0 = Instant::now();
        click(&mut app, SELECT_BUTTON.0, SELECT_BUTTON.1, t0);
        let (x, y) = popup_item(0);
        click(&mut app, x, y, t0);
        let (x, y) = white_key(&app, "C4");
        click(&mut app, x, y, t0);
        assert_eq!(app.mode(), Mode::Complete);

        // Even the spot where Exit usually sits does nothing.
        click(&mut app, EXIT_BUTTON.0, EXIT_BUTTON.1, t0);
        assert!(!app.quit_requested());
        assert_eq!(app.mode(), Mode::Complete);
    }

    #[test]
    fn exit_sheet_returns_to_free_play() {
        let (mut app, _log) = make_app();
        let now = Instant::now();
        click(&mut app, SELECT_BUTTON.0, SELECT_BUTTON.1, now);
        let (x, y) = popup_item(1);
        click(&mut app, x, y, now);
        assert_eq!(app.mode(), Mode::SheetPlay);
        click(&mut app, EXIT_SHEET.0, EXIT_SHEET.1, now);
        assert_eq!(app.mode(), Mode::Normal);
        assert!(app.progress().is_none());
    }

    #[test]
    fn exit_button_requests_quit() {
        let (mut app, _log) = make_app();
        click(&mut app, EXIT_BUTTON.0, EXIT_BUTTON.1, Instant::now());
        assert!(app.quit_requested());
    }

    #[test]
    fn button_flash_expires() {
        let (mut app, _log) = make_app();
        let t0 = Instant::now();
        click(&mut app, SELECT_BUTTON.0, SELECT_BUTTON.1, t0);
        let id = RegionId::new("button:select");
        // Pointer still sits where the button used to be, but the mode changed.
        assert_eq!(app.ui_state(&id), UiState::Active);
        app.tick(t0 + BUTTON_FLASH);
        assert_eq!(app.ui_state(&id), UiState::Normal);
    }

    #[test]
    fn hand_loss_releases_note() {
        let (mut app, log) = make_app();
        let now = Instant::now();
        let (x, y) = white_key(&app, "A4");
        app.handle_frame(&hand(x, y, true), now);
        for _ in 0..=5 {
            app.handle_frame(&[], now);
        }
        assert_eq!(*log.lock(), vec![Note::On(69), Note::Off(69)]);
    }

    #[test]
    fn shutdown_releases_held_note() {
        let (mut app, log) = make_app();
        let (x, y) = white_key(&app, "G4");
        app.handle_frame(&hand(x, y, true), Instant::now());
        app.shutdown();
        assert_eq!(*log.lock(), vec![Note::On(67), Note::Off(67)]);
        app.shutdown();
        assert_eq!(log.lock().len(), 2);
    }
}
