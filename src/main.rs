//! CLI entry point. Wires the flags described in the external interfaces
//! section to `Config`, `LineRecordReader`, `Orchestrator` and
//! `CsvFeatureWriter`. Interactive plotting (`graphics`, `Graphics=<ms>`) and
//! GPU device selection are accepted for compatibility but are no-ops: this
//! binary is deliberately thin glue around the library, not a reimplementation
//! of the originating tool's UI.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};

use anyhow::{Context, Result};
use clap::Parser;

use sipm_sim::io::{CsvFeatureWriter, Geometry, LineRecordReader, OutputSink, PhotonSource};
use sipm_sim::{Config, Orchestrator, RawConfig};

#[derive(Parser, Debug)]
#[command(name = "sipm-sim", about = "Monte Carlo simulator of SiPM detector response")]
struct Cli {
    /// Input file of photon-arrival records (eventId fiberType fiberId x y z t0 t1 ...).
    input: String,

    /// Compute device. `gpu` is accepted but falls back to CPU (no GPU backend implemented).
    #[arg(long, default_value = "cpu")]
    device: String,

    /// Number of worker threads. Defaults to available parallelism.
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Show histograms of generated events. Accepted but not implemented (no-op).
    #[arg(short = 'g', long)]
    graphics: bool,

    /// Interactive per-signal plotting interval in ms. Accepted but not implemented (no-op).
    #[arg(short = 'G', long = "Graphics")]
    graphics_interval_ms: Option<u64>,

    /// Activate verbose per-event debug logging and force feature computation below threshold.
    #[arg(short = 'D', long)]
    debug: bool,

    /// Suppress the startup settings banner.
    #[arg(short, long)]
    quiet: bool,

    /// File to write extracted features and geometry to, CSV-shaped.
    #[arg(short, long)]
    write: Option<String>,

    /// File to dump digitized waveforms to, one row of little-endian f32 samples per event.
    #[arg(short = 'W', long)]
    wavedump: Option<String>,

    /// Recompute every pulse exactly instead of using the shift-and-scale template.
    #[arg(short = 'S', long)]
    signal: bool,

    #[arg(long = "nodcr")]
    nodcr: bool,
    #[arg(long = "noxt")]
    noxt: bool,
    #[arg(long = "noap")]
    noap: bool,

    /// Settings file overriding the defaults, as `KEY = value` lines.
    #[arg(short, long)]
    fname: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.device == "gpu" {
        log::warn!("GPU device requested, but no GPU backend is implemented; using CPU");
    }

    let mut raw = RawConfig::default();
    if let Some(fname) = &cli.fname {
        apply_settings_file(&mut raw, fname)
            .with_context(|| format!("reading settings file {fname}"))?;
    }
    raw.nodcr |= cli.nodcr;
    raw.noxt |= cli.noxt;
    raw.noap |= cli.noap;
    raw.exact_signal |= cli.signal;

    let config = Config::build(raw).context("invalid configuration")?;
    if !cli.quiet {
        config.log_settings_banner();
    }

    let jobs = cli.jobs.unwrap_or_else(num_cpus_fallback);
    let orchestrator = Orchestrator::new(config, jobs);

    let input_file =
        File::open(&cli.input).with_context(|| format!("opening input file {}", cli.input))?;
    let mut reader = LineRecordReader::new(BufReader::new(input_file));

    let mut records = Vec::new();
    let mut geometries = Vec::new();
    while let Some(record) = reader.next_record().context("reading input record")? {
        geometries.push(Geometry {
            event_id: record.event_id,
            fiber_type_is_scintillating: record.fiber_type == "Scin",
            fiber_id: record.fiber_id,
            x: record.x,
            y: record.y,
            z: record.z,
        });
        records.push((record.photon_times, geometries.len() - 1));
    }

    let want_waveforms = cli.wavedump.is_some();
    let results = orchestrator.run(records, want_waveforms, cli.debug);

    if let Some(write_path) = &cli.write {
        let out_file = File::create(write_path)
            .with_context(|| format!("creating output file {write_path}"))?;
        let mut sink = CsvFeatureWriter::new(out_file);
        for (features, geom_index, _, _) in &results {
            sink.write_feature_row(features, &geometries[*geom_index])?;
        }
    }

    if let Some(wavedump_path) = &cli.wavedump {
        let mut out_file = File::create(wavedump_path)
            .with_context(|| format!("creating wavedump file {wavedump_path}"))?;
        for (_, _, waveform, _) in &results {
            if let Some(waveform) = waveform {
                for &sample in waveform {
                    out_file.write_all(&(sample as f32).to_le_bytes())?;
                }
            }
        }
    }

    if cli.graphics || cli.graphics_interval_ms.is_some() {
        log::info!("graphics requested, but interactive plotting is not implemented; skipping");
    }

    log::info!("processed {} events", results.len());
    Ok(())
}

fn num_cpus_fallback() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Parses a minimal `KEY = value` settings file, one override per line,
/// `#`-prefixed lines ignored. A deliberately small stand-in for the
/// originating tool's "exec an arbitrary settings script" mechanism.
fn apply_settings_file(raw: &mut RawConfig, fname: &str) -> Result<()> {
    let file = File::open(fname)?;
    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        apply_setting(raw, key, value)?;
    }
    Ok(())
}

fn apply_setting(raw: &mut RawConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "SIGLEN" => raw.siglen_ns = value.parse()?,
        "SAMPLING" => raw.sampling_ns = value.parse()?,
        "SIZE" => raw.size_mm = value.parse()?,
        "CELLSIZE" => raw.cellsize_um = value.parse()?,
        "DCR" => raw.dcr_hz = value.parse()?,
        "XT" => raw.xt = value.parse()?,
        "AP" => raw.ap = value.parse()?,
        "TFALL" => raw.tfall_ns = value.parse()?,
        "TRISE" => raw.trise_ns = value.parse()?,
        "CELLRECOVERY" => raw.cellrecovery_ns = value.parse()?,
        "TAUAPFAST" => raw.tauapfast_ns = value.parse()?,
        "TAUAPSLOW" => raw.tauapslow_ns = value.parse()?,
        "SNR" => raw.snr_db = value.parse()?,
        "BASESPREAD" => raw.basespread = value.parse()?,
        "CCGV" => raw.ccgv = value.parse()?,
        "INTSTART" => raw.intstart_ns = value.parse()?,
        "INTGATE" => raw.intgate_ns = value.parse()?,
        "THRESHOLD" => raw.threshold = value.parse()?,
        other => log::warn!("ignoring unknown setting {other:?} in settings file"),
    }
    Ok(())
}
