use anyhow::{Context, Result};
use clap::Parser;
use roadveil_core::config::{load_properties, PrivacyConfig};
use roadveil_core::types::Verdict;
use roadveil_filter::BsmHandler;
use roadveil_geo::RoadMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// roadveil - privacy-protection stream filter for connected-vehicle BSMs
///
/// Reads newline-delimited BSM JSON, suppresses messages by speed or
/// geofence position, redacts identifying fields from the rest, and writes
/// the surviving messages back out one per line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the privacy property file
    #[arg(short, long, default_value = "config/ppm.properties")]
    config: PathBuf,

    /// Path to the road-segment map file
    #[arg(short, long)]
    map: PathBuf,

    /// Input file of newline-delimited BSMs (stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file for redacted BSMs (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Per-verdict counters reported at shutdown.
#[derive(Debug, Default)]
struct Tally {
    success: u64,
    speed: u64,
    geoposition: u64,
    parse: u64,
    missing: u64,
    other: u64,
}

impl Tally {
    fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Success => self.success += 1,
            Verdict::Speed => self.speed += 1,
            Verdict::Geoposition => self.geoposition += 1,
            Verdict::Parse => self.parse += 1,
            Verdict::Missing => self.missing += 1,
            Verdict::Other => self.other += 1,
        }
    }

    fn total(&self) -> u64 {
        self.success + self.speed + self.geoposition + self.parse + self.missing + self.other
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let properties = load_properties(&args.config)
        .with_context(|| format!("Failed to read config file: {:?}", args.config))?;
    let config = PrivacyConfig::from_map(&properties).context("Failed to parse configuration")?;

    let map = RoadMap::load(&args.map)
        .with_context(|| format!("Failed to load map file: {:?}", args.map))?;
    let quad = Arc::new(map.build_index(config.box_extension_m));

    info!("Starting roadveil");
    info!("Configuration loaded from {:?}", args.config);
    info!(
        edges = quad.len(),
        extension_m = config.box_extension_m,
        "Geofence index ready"
    );

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open input: {path:?}"))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create output: {path:?}"))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let mut handler = BsmHandler::new(quad, &config);
    let mut tally = Tally::default();

    for line in reader.lines() {
        let line = line.context("Failed to read input line")?;
        if line.trim().is_empty() {
            continue;
        }

        let verdict = handler.process(&line);
        tally.record(verdict);

        if let Some(json) = handler.get_json() {
            writer.write_all(json.as_bytes())?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;

    info!(
        processed = tally.total(),
        success = tally.success,
        speed = tally.speed,
        geoposition = tally.geoposition,
        parse = tally.parse,
        missing = tally.missing,
        other = tally.other,
        "Finished processing"
    );

    Ok(())
}
