//! Replays tracker output through the classifier.
//!
//! Input is one JSON `Frame` per line:
//! `{"index": 0, "timestamp": 0.0, "observations": [{"track_id": 1, "bbox": [x1, y1, x2, y2]}]}`
//! and output is one JSON array of results per line.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use qbehave::{Config, Frame, FrameProcessor, Scenario};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Classify tracked people frame by frame")]
struct Args {
    /// Scenario config (JSON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames file (JSON lines). Reads stdin when omitted.
    #[arg(long)]
    frames: Option<PathBuf>,

    /// BEHAVIOR, LINE_CROSSING or COMBINED
    #[arg(long)]
    scenario: Option<String>,

    /// "x1,y1,x2,y2"
    #[arg(long)]
    line: Option<String>,

    /// "x,y"
    #[arg(long)]
    restricted_point: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(scenario) = &args.scenario {
        config.scenario = scenario.parse::<Scenario>()?;
    }

    if let Some(line) = &args.line {
        config.apply_line_override(line);
    }

    if let Some(point) = &args.restricted_point {
        config.apply_restricted_point_override(point);
    }

    let mut processor = FrameProcessor::new(&config)?;

    let input: Box<dyn BufRead> = match &args.frames {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut frames = 0usize;

    for (lineno, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let frame: Frame = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("line {}: wrong frame format: {}", lineno + 1, err);
                continue;
            }
        };

        let results = processor.process(&frame);
        serde_json::to_writer(&mut out, &results)?;
        out.write_all(b"\n")?;
        frames += 1;
    }

    info!(
        "processed {} frame(s), {} track(s) alive",
        frames,
        processor.store().len()
    );

    Ok(())
}
