//! pinch_piano — interactive entry point.

use std::path::PathBuf;

use clap::Parser;
use pinch_piano::{init_logging, run, AppConfig, DriftSetting, SourceKind};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pinch_piano", version, about = "Hand-tracked piano: point with your index finger, pinch to play")]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where hand landmarks come from
    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    /// Detector command and its arguments (implies --source detector); must come last
    #[arg(long = "detector-cmd", value_name = "ARG", num_args = 1.., allow_hyphen_values = true)]
    detector_cmd: Vec<String>,

    /// Pointer smoothing factor in (0, 1]
    #[arg(long)]
    smoothing: Option<f32>,

    /// Normalized thumb-index distance that starts a pinch
    #[arg(long)]
    pinch_enter: Option<f32>,

    /// Normalized thumb-index distance that ends a pinch
    #[arg(long)]
    pinch_exit: Option<f32>,

    /// Hand-less frames tolerated before the pointer hides
    #[arg(long)]
    miss_tolerance: Option<u32>,

    /// What a held key does when the pointer slides off it
    #[arg(long, value_enum)]
    drift: Option<DriftSetting>,

    /// Do not mirror camera input
    #[arg(long)]
    no_mirror: bool,

    /// General MIDI program (0 = acoustic grand)
    #[arg(long)]
    program: Option<u8>,

    #[arg(long)]
    velocity: Option<u8>,

    /// Substring of the MIDI output port to open
    #[arg(long)]
    midi_port: Option<String>,

    #[arg(long)]
    fps: Option<u32>,
}

impl Cli {
    fn apply(self, mut cfg: AppConfig) -> AppConfig {
        if let Some(s) = self.source         { cfg.source = s; }
        if !self.detector_cmd.is_empty() {
            cfg.detector_command = self.detector_cmd;
            if self.source.is_none() { cfg.source = SourceKind::Detector; }
        }
        if let Some(v) = self.smoothing      { cfg.smoothing = v; }
        if let Some(v) = self.pinch_enter    { cfg.pinch_enter = v; }
        if let Some(v) = self.pinch_exit     { cfg.pinch_exit = v; }
        if let Some(v) = self.miss_tolerance { cfg.miss_tolerance = v; }
        if let Some(v) = self.drift          { cfg.drift = v; }
        if self.no_mirror                    { cfg.mirror = false; }
        if let Some(v) = self.program        { cfg.midi_program = v; }
        if let Some(v) = self.velocity       { cfg.velocity = v; }
        if let Some(v) = self.midi_port      { cfg.midi_port = Some(v); }
        if let Some(v) = self.fps            { cfg.fps = v; }
        cfg
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Pinch Piano: point with your index, pinch to play     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  LeapMotion support compiled in  (--source leap)");
    #[cfg(not(feature = "leap"))]
    println!("  Mouse simulation by default  (use --features leap for hardware)");
    println!();

    init_logging();

    let base = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None       => AppConfig::default(),
    };
    let cfg = cli.apply(base);
    info!(source = ?cfg.source, "starting");

    run(cfg)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
