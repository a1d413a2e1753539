//! Real-time MIDI playback thread.
//!
//! Key presses become note-on / note-off commands sent over a channel to a
//! thread that owns the MIDI connection, so a slow port never stalls the
//! frame loop.  When the thread quits it silences every note still sounding.

use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::config::MidiSettings;

// ════════════════════════════════════════════════════════════════════════════
// NoteSink — what the app talks to
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can start and stop notes.
pub trait NoteSink {
    fn note_on(&mut self, note: u8);
    fn note_off(&mut self, note: u8);
}

// ════════════════════════════════════════════════════════════════════════════
// PlayerCommand — sent to the playback thread
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerCommand {
    NoteOn(u8),
    NoteOff(u8),
    /// Silence everything and terminate the thread.
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null
// ════════════════════════════════════════════════════════════════════════════

pub trait MidiOut: Send {
    fn program_change(&mut self, channel: u8, program: u8);
    fn note_on(&mut self,  channel: u8, note: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, note: u8);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) {
        self.send(&[0xC0 | (channel & 0x0F), program & 0x7F]);
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        self.send(&[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]);
    }
    fn note_off(&mut self, channel: u8, note: u8) {
        self.send(&[0x80 | (channel & 0x0F), note & 0x7F, 0]);
    }
}

impl MidirOut {
    fn send(&mut self, msg: &[u8]) {
        if let Err(e) = self.conn.send(msg) {
            warn!("MIDI send failed: {}", e);
        }
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

pub struct NullOut;
impl MidiOut for NullOut {
    fn program_change(&mut self, _ch: u8, _p: u8)   {}
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8)  {}
    fn note_off(&mut self, _ch: u8, _n: u8)          {}
}

// ════════════════════════════════════════════════════════════════════════════
// open_midi_output — enumerate ports and pick one
// ════════════════════════════════════════════════════════════════════════════

const SOFTSYNTH_HINTS: [&str; 5] = ["fluid", "timidity", "microsoft", "gm", "synth"];

/// Index of the port to open: the first whose name contains `preferred`,
/// else the first that looks like a softsynth, else the first.
fn choose_port(names: &[String], preferred: Option<&str>) -> Option<usize> {
    if names.is_empty() { return None; }
    let lower: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();

    if let Some(want) = preferred.map(str::to_lowercase) {
        if let Some(i) = lower.iter().position(|n| n.contains(&want)) {
            return Some(i);
        }
        warn!("no MIDI port matches {:?}", want);
    }

    let synth = lower.iter().position(|n| SOFTSYNTH_HINTS.iter().any(|h| n.contains(h)));
    Some(synth.unwrap_or(0))
}

/// Try to open a MIDI output port.
/// Falls back to `NullOut` with a warning if none can be opened.
fn open_midi_output(preferred: Option<&str>) -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("pinch_piano") {
        Ok(m)  => m,
        Err(e) => {
            warn!("MIDI init error: {}; using null output", e);
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    let names: Vec<String> = ports.iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect();

    let Some(idx) = choose_port(&names, preferred) else {
        warn!("no MIDI output ports found; using null output");
        warn!("install a synthesiser, e.g. `timidity -iA` or `fluidsynth` on Linux");
        return Box::new(NullOut);
    };

    info!("opening MIDI port: {}", names[idx]);
    match midi_out.connect(&ports[idx], "pinch-piano-out") {
        Ok(conn) => Box::new(MidirOut { conn }),
        Err(e) => {
            warn!("failed to connect MIDI port: {}; using null output", e);
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Player — handle to the playback thread
// ════════════════════════════════════════════════════════════════════════════

pub struct Player {
    cmd_tx: Sender<PlayerCommand>,
    handle: Option<JoinHandle<()>>,
}

impl Player {
    /// Spawn the playback thread on the configured (or best available) port.
    pub fn spawn(midi: MidiSettings) -> Self {
        Self::spawn_with(midi, |settings| open_midi_output(settings.port.as_deref()))
    }

    /// Spawn with an explicit output; the opener runs on the player thread.
    pub fn spawn_with<F>(midi: MidiSettings, open: F) -> Self
    where
        F: FnOnce(&MidiSettings) -> Box<dyn MidiOut> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlayerCommand>();
        let handle = thread::spawn(move || {
            let mut out = open(&midi);
            player_loop(out.as_mut(), &midi, cmd_rx);
        });
        Player { cmd_tx, handle: Some(handle) }
    }

    /// Silence everything and wait for the thread to exit.
    pub fn quit(&mut self) {
        self.send(PlayerCommand::Quit);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }

    fn send(&self, cmd: PlayerCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            debug!("player thread gone, dropped {:?}", cmd);
        }
    }
}

impl NoteSink for Player {
    fn note_on(&mut self, note: u8)  { self.send(PlayerCommand::NoteOn(note)); }
    fn note_off(&mut self, note: u8) { self.send(PlayerCommand::NoteOff(note)); }
}

impl Drop for Player {
    fn drop(&mut self) { self.quit(); }
}

// ════════════════════════════════════════════════════════════════════════════
// player_loop — the thread body
// ════════════════════════════════════════════════════════════════════════════

fn player_loop(out: &mut dyn MidiOut, midi: &MidiSettings, cmd_rx: Receiver<PlayerCommand>) {
    let channel = midi.channel;
    let mut sounding = BTreeSet::new();

    out.program_change(channel, midi.program);

    // A closed channel means the handle was dropped: same as Quit.
    for cmd in cmd_rx.iter() {
        match cmd {
            PlayerCommand::NoteOn(n) => {
                // Retrigger cleanly if the note is already down.
                if !sounding.insert(n) {
                    out.note_off(channel, n);
                }
                out.note_on(channel, n, midi.velocity);
            }
            PlayerCommand::NoteOff(n) => {
                if sounding.remove(&n) {
                    out.note_off(channel, n);
                }
            }
            PlayerCommand::Quit => break,
        }
    }

    for n in sounding {
        out.note_off(channel, n);
    }
    debug!("player thread exiting");
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq)]
    enum Msg { Program(u8), On(u8, u8), Off(u8) }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Msg>>>);

    impl MidiOut for Recorder {
        fn program_change(&mut self, _ch: u8, p: u8) { self.0.lock().push(Msg::Program(p)); }
        fn note_on(&mut self, _ch: u8, n: u8, v: u8) { self.0.lock().push(Msg::On(n, v)); }
        fn note_off(&mut self, _ch: u8, n: u8)       { self.0.lock().push(Msg::Off(n)); }
    }

    fn run(cmds: &[PlayerCommand]) -> Vec<Msg> {
        let rec = Recorder::default();
        let log = rec.0.clone();
        let mut player = Player::spawn_with(
            MidiSettings { program: 11, velocity: 90, ..MidiSettings::default() },
            move |_| Box::new(rec),
        );
        for &c in cmds { player.send(c); }
        player.quit();
        let out = log.lock().clone();
        out
    }

    #[test]
    fn program_then_notes() {
        let got = run(&[PlayerCommand::NoteOn(60), PlayerCommand::NoteOff(60)]);
        assert_eq!(got, vec![Msg::Program(11), Msg::On(60, 90), Msg::Off(60)]);
    }

    #[test]
    fn quit_silences_held_notes() {
        let got = run(&[PlayerCommand::NoteOn(64), PlayerCommand::NoteOn(60)]);
        assert_eq!(&got[3..], &[Msg::Off(60), Msg::Off(64)]);
    }

    #[test]
    fn stray_note_off_is_ignored() {
        let got = run(&[PlayerCommand::NoteOff(61)]);
        assert_eq!(got, vec![Msg::Program(11)]);
    }

    #[test]
    fn retrigger_sends_off_first() {
        let got = run(&[PlayerCommand::NoteOn(62), PlayerCommand::NoteOn(62)]);
        assert_eq!(got, vec![
            Msg::Program(11),
            Msg::On(62, 90),
            Msg::Off(62),
            Msg::On(62, 90),
            Msg::Off(62),
        ]);
    }

    #[test]
    fn port_choice() {
        let names: Vec<String> = ["Midi Through", "FLUID Synth", "USB Keys"]
            .iter().map(|s| s.to_string()).collect();
        assert_eq!(choose_port(&names, None), Some(1));
        assert_eq!(choose_port(&names, Some("usb")), Some(2));
        assert_eq!(choose_port(&names, Some("missing")), Some(1));
        assert_eq!(choose_port(&names[..1], None), Some(0));
        assert_eq!(choose_port(&[], None), None);
    }
}
