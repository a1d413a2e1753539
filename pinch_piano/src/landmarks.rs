//! Landmark sources: mouse simulation, an external detector process, and
//! (with `--features leap`) a LeapMotion controller.
//!
//! Every source runs on its own thread and publishes each completed
//! detection into a [`LatestSlot`].  The main loop takes whatever is newest;
//! a detection that is overwritten before it is taken is simply dropped, so
//! the pipeline never works through a backlog of stale frames.
//!
//! ```text
//!  source thread ──publish──▶ LatestSlot ──take──▶ main loop ─▶ GesturePipeline
//!                (overwrites)              (empties)
//! ```

use std::io::BufRead;
use std::process::{Command, Stdio};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use hand_pointer::{synthetic_hand, Hand, Landmark};
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::SourceError;

// ════════════════════════════════════════════════════════════════════════════
// LatestSlot — single-entry, latest-wins hand-off
// ════════════════════════════════════════════════════════════════════════════

/// Run once when the consumer asks the producer to stop, e.g. to kill a
/// child process whose stdout the producer is blocked on.
type StopHook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct SlotState {
    latest:      Option<Vec<Hand>>,
    published:   u64,
    overwritten: u64,
    closed:      bool,
    stop:        bool,
    on_stop:     Option<StopHook>,
}

/// Shared between one producer thread and the main loop.
#[derive(Clone, Default)]
pub struct LatestSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl LatestSlot {
    pub fn new() -> Self { Self::default() }

    /// Store a detection, replacing one the consumer has not taken yet.
    pub fn publish(&self, hands: Vec<Hand>) {
        let mut s = self.inner.lock();
        if s.latest.replace(hands).is_some() {
            s.overwritten += 1;
        }
        s.published += 1;
    }

    pub fn take(&self) -> Option<Vec<Hand>> {
        self.inner.lock().latest.take()
    }

    /// Producer side: no more detections will arrive.
    pub fn close(&self) { self.inner.lock().closed = true; }
    pub fn is_closed(&self) -> bool { self.inner.lock().closed }

    /// Consumer side: ask the producer to wind down.  Runs the stop hook,
    /// if any, outside the lock.
    pub fn request_stop(&self) {
        let hook = {
            let mut s = self.inner.lock();
            s.stop = true;
            s.on_stop.take()
        };
        if let Some(hook) = hook { hook(); }
    }

    pub fn stop_requested(&self) -> bool { self.inner.lock().stop }

    /// Producer side: install the hook `request_stop` runs.  If a stop was
    /// already requested the hook runs immediately.
    pub fn on_stop(&self, hook: impl FnOnce() + Send + 'static) {
        let mut s = self.inner.lock();
        if s.stop {
            drop(s);
            hook();
        } else {
            s.on_stop = Some(Box::new(hook));
        }
    }

    /// (published, overwritten before being taken)
    pub fn counts(&self) -> (u64, u64) {
        let s = self.inner.lock();
        (s.published, s.overwritten)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait + spawn helper
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can publish hand detections from its own thread.
pub trait LandmarkSource: Send + 'static {
    fn name(&self) -> &'static str;

    /// Publish detections until the source ends or a stop is requested.
    fn run(self: Box<Self>, slot: LatestSlot) -> Result<(), SourceError>;
}

/// Main-loop handle to a running source.
pub struct LandmarkFeed {
    name:   &'static str,
    slot:   LatestSlot,
    handle: Option<JoinHandle<()>>,
}

impl LandmarkFeed {
    pub fn name(&self) -> &'static str { self.name }
    pub fn take(&self) -> Option<Vec<Hand>> { self.slot.take() }
    pub fn is_closed(&self) -> bool { self.slot.is_closed() }
}

impl Drop for LandmarkFeed {
    fn drop(&mut self) {
        self.slot.request_stop();
        let (published, overwritten) = self.slot.counts();
        debug!("{}: {} detections, {} dropped as stale", self.name, published, overwritten);
        // A reader blocked on a pipe may never return; only join finished threads.
        if let Some(h) = self.handle.take() {
            if h.is_finished() {
                let _ = h.join();
            }
        }
    }
}

/// Spawn a source on its own thread.  Errors are logged and close the slot.
pub fn spawn_landmark_source<S: LandmarkSource>(source: S) -> LandmarkFeed {
    let name = source.name();
    let slot = LatestSlot::new();
    let producer = slot.clone();

    let handle = thread::spawn(move || {
        info!("{}: landmark source started", name);
        match Box::new(source).run(producer.clone()) {
            Ok(())  => info!("{}: landmark source finished", name),
            Err(e)  => warn!("{}: {}", name, e),
        }
        producer.close();
    });

    LandmarkFeed { name, slot, handle: Some(handle) }
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource — mouse over the window
// ════════════════════════════════════════════════════════════════════════════

/// One sample of the simulation window's input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimInput {
    /// Normalized cursor position, `None` when outside the window.
    pub cursor: Option<(f32, f32)>,
    pub pinch:  bool,
}

const SIM_PINCH_GAP: f32 = 0.01;
const SIM_OPEN_GAP:  f32 = 0.12;

/// Build the detection a real hand would produce for this input.
pub fn sim_hands(input: SimInput) -> Vec<Hand> {
    let Some((x, y)) = input.cursor else { return Vec::new() };
    let tip = Landmark::new(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
    let thumb = if input.pinch {
        let dx = if tip.x > 0.5 { -SIM_PINCH_GAP } else { SIM_PINCH_GAP };
        Landmark::new(tip.x + dx, tip.y)
    } else {
        // Open thumb hangs towards the middle of the frame so it stays in range.
        let dy = if tip.y > 0.5 { -SIM_OPEN_GAP } else { SIM_OPEN_GAP };
        Landmark::new(tip.x, tip.y + dy)
    };
    vec![synthetic_hand(thumb, tip)]
}

/// Fed by the visualizer once per rendered frame.
pub struct SimLandmarkSource {
    pub rx: Receiver<SimInput>,
}

impl LandmarkSource for SimLandmarkSource {
    fn name(&self) -> &'static str { "sim" }

    fn run(self: Box<Self>, slot: LatestSlot) -> Result<(), SourceError> {
        for input in self.rx {
            if slot.stop_requested() { return Ok(()); }
            slot.publish(sim_hands(input));
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// JsonLinesSource — external detector process
// ════════════════════════════════════════════════════════════════════════════

/// One line of detector output.
#[derive(Debug, Deserialize)]
struct DetectionLine {
    #[serde(default)]
    hands: Vec<Hand>,
}

/// Parse one JSON detection: `{"hands":[{"handedness":"Right","landmarks":[{"x":..,"y":..}, ..]}]}`.
pub fn parse_detection(line: &str, line_no: u64) -> Result<Vec<Hand>, SourceError> {
    serde_json::from_str::<DetectionLine>(line)
        .map(|d| d.hands)
        .map_err(|source| SourceError::Parse { line: line_no, source })
}

/// Publish every detection from `reader`.  A malformed line counts as a
/// frame with no hand.  Returns `Disconnected` at end of input.
pub fn read_detections<R: BufRead>(reader: R, slot: &LatestSlot) -> Result<(), SourceError> {
    for (n, line) in reader.lines().enumerate() {
        if slot.stop_requested() { return Ok(()); }
        let line = line?;
        if line.trim().is_empty() { continue; }
        match parse_detection(&line, n as u64 + 1) {
            Ok(hands) => slot.publish(hands),
            Err(e) => {
                warn!("{}", e);
                slot.publish(Vec::new());
            }
        }
    }
    Err(SourceError::Disconnected)
}

/// Spawns `command` and reads one detection per stdout line.
pub struct JsonLinesSource {
    pub command: Vec<String>,
}

impl LandmarkSource for JsonLinesSource {
    fn name(&self) -> &'static str { "detector" }

    fn run(self: Box<Self>, slot: LatestSlot) -> Result<(), SourceError> {
        let joined = self.command.join(" ");
        let (program, args) = self.command.split_first()
            .ok_or_else(|| SourceError::Spawn {
                command: joined.clone(),
                source:  std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            })?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| SourceError::Spawn { command: joined.clone(), source })?;
        info!("detector: spawned {:?} (pid {})", joined, child.id());

        let stdout = child.stdout.take();
        let child = Arc::new(Mutex::new(child));

        // Killing the detector closes its stdout, which unblocks the reader.
        let killer = Arc::clone(&child);
        slot.on_stop(move || {
            debug!("detector: stop requested, killing child");
            let _ = killer.lock().kill();
        });

        let result = match stdout {
            Some(stdout) => read_detections(std::io::BufReader::new(stdout), &slot),
            None         => Err(SourceError::NoStdout),
        };

        let mut child = child.lock();
        let _ = child.kill();
        let _ = child.wait();
        result
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Fixed interaction box above the controller, millimetres.
#[cfg(feature = "leap")]
const LEAP_BOX_X: (f32, f32) = (-150.0, 150.0);
#[cfg(feature = "leap")]
const LEAP_BOX_Y: (f32, f32) = (100.0, 400.0);

/// Map a Leap position (x right, y up) into the normalized frame (y down).
#[cfg(feature = "leap")]
pub fn leap_to_normalized(x_mm: f32, y_mm: f32) -> Landmark {
    let nx = (x_mm - LEAP_BOX_X.0) / (LEAP_BOX_X.1 - LEAP_BOX_X.0);
    let ny = 1.0 - (y_mm - LEAP_BOX_Y.0) / (LEAP_BOX_Y.1 - LEAP_BOX_Y.0);
    Landmark::new(nx.clamp(0.0, 1.0), ny.clamp(0.0, 1.0))
}

/// Thumb and index distal tips from a LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
#[cfg(feature = "leap")]
pub struct LeapSource;

#[cfg(feature = "leap")]
impl LandmarkSource for LeapSource {
    fn name(&self) -> &'static str { "leap" }

    fn run(self: Box<Self>, slot: LatestSlot) -> Result<(), SourceError> {
        use leaprs::*;

        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| SourceError::Device(format!("LeapC connection: {:?}", e)))?;
        connection.open()
            .map_err(|e| SourceError::Device(format!("opening device: {:?}", e)))?;

        while !slot.stop_requested() {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };
            if let Event::Tracking(frame) = msg.event() {
                let hands = frame.hands().filter_map(|h| leap_hand(&h)).collect();
                slot.publish(hands);
            }
        }
        Ok(())
    }
}

#[cfg(feature = "leap")]
fn leap_hand(hand: &leaprs::Hand) -> Option<Hand> {
    use hand_pointer::Handedness;

    let digits: Vec<_> = hand.digits().collect();
    if digits.len() < 2 { return None; }
    let thumb = digits[0].distal().next_joint();
    let index = digits[1].distal().next_joint();

    let mut h = synthetic_hand(
        leap_to_normalized(thumb.x, thumb.y),
        leap_to_normalized(index.x, index.y),
    );
    h.handedness = Some(match hand.hand_type() {
        leaprs::HandType::Left => Handedness::Left,
        _                      => Handedness::Right,
    });
    Some(h)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
