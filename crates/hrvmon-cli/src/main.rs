use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use hrvmon_lib::{
    buffer::IntervalBuffer,
    config::AnalysisConfig,
    io::{
        csv as csv_io,
        notification::{parse_hex_payload, to_hex},
        session::read_session_log,
        text::{self as text_io, RrUnit},
    },
    metrics::hrv::{hrv_lf_hf, hrv_psd, LfHfResult, Measure},
    monitor::{Monitor, DEFAULT_FLUSH_INTERVAL_S},
    pacer::{BreathingPacer, DEFAULT_BREATHING_RATE, DEFAULT_TICK_MS},
    plot::{figure_from_spectrum, Figure, Series},
    signal::RRSeries,
    simulate::{simulate_notifications, SimulationConfig},
};
use log::{debug, info, warn};
use plotters::prelude::*;
use serde::Serialize;
use std::{
    fs,
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "hrvmon",
    version,
    about = "hrvmon: LF/HF heart rate variability from RR interval streams"
)]
struct Cli {
    /// Analysis parameters (TOML); built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum UnitArg {
    #[value(name = "ms")]
    Millis,
    #[value(name = "s")]
    Seconds,
}

impl From<UnitArg> for RrUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Millis => RrUnit::Millis,
            UnitArg::Seconds => RrUnit::Seconds,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// LF/HF of an RR series read from stdin or --input
    LfHf {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "ms")]
        unit: UnitArg,
        /// Read RR values from this column of a CSV file
        #[arg(long, requires = "input")]
        csv_column: Option<String>,
        /// Analyse the whole series instead of the trailing window
        #[arg(long)]
        whole: bool,
    },
    /// Replay hex-encoded heart rate notifications, one per line
    Monitor {
        #[arg(long)]
        input: PathBuf,
        /// Session log to overwrite on every flush
        #[arg(long)]
        session_out: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_FLUSH_INTERVAL_S)]
        flush_interval_s: f64,
    },
    /// Feed a saved session log back through the analysis
    ReplaySession {
        #[arg(long)]
        input: PathBuf,
    },
    /// Write synthetic heart rate notifications as hex lines
    Simulate {
        #[arg(long, default_value_t = 120)]
        beats: usize,
        #[arg(long, default_value_t = 7)]
        seed: u64,
        #[arg(long, default_value_t = 0.25)]
        modulation_hz: f64,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Render the RR spectrum with LF/HF band edges to a PNG via plotters
    PsdPlot {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "ms")]
        unit: UnitArg,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 0.5)]
        max_freq: f64,
    },
    /// Print breathing pacer frames as JSON lines
    Pacer {
        /// Breaths per minute
        #[arg(long, default_value_t = DEFAULT_BREATHING_RATE)]
        rate: f64,
        #[arg(long, default_value_t = 10.0)]
        duration_s: f64,
    },
}

#[derive(Serialize)]
struct LfHfReport {
    intervals: usize,
    lf: Measure,
    hf: Measure,
    lf_hf: Measure,
}

impl LfHfReport {
    fn new(intervals: usize, result: LfHfResult) -> Self {
        Self {
            intervals,
            lf: result.lf,
            hf: result.hf,
            lf_hf: result.lf_hf,
        }
    }
}

#[derive(Serialize)]
struct ReplayReport {
    records: usize,
    buffered: usize,
    result: LfHfResult,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();
    let cfg = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::LfHf {
            input,
            unit,
            csv_column,
            whole,
        } => cmd_lf_hf(
            &cfg,
            input.as_deref(),
            unit.into(),
            csv_column.as_deref(),
            whole,
        )?,
        Commands::Monitor {
            input,
            session_out,
            flush_interval_s,
        } => cmd_monitor(cfg, &input, session_out.as_deref(), flush_interval_s)?,
        Commands::ReplaySession { input } => cmd_replay_session(cfg, &input)?,
        Commands::Simulate {
            beats,
            seed,
            modulation_hz,
            out,
        } => cmd_simulate(beats, seed, modulation_hz, out.as_deref())?,
        Commands::PsdPlot {
            input,
            unit,
            out,
            max_freq,
        } => cmd_psd_plot(&cfg, input.as_deref(), unit.into(), &out, max_freq)?,
        Commands::Pacer { rate, duration_s } => cmd_pacer(rate, duration_s)?,
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => {
            let cfg = AnalysisConfig::load(path)?;
            debug!("loaded analysis config from {}: {:?}", path.display(), cfg);
            Ok(cfg)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

fn read_rr(input: Option<&Path>, unit: RrUnit, csv_column: Option<&str>) -> Result<RRSeries> {
    match (input, csv_column) {
        (Some(path), Some(column)) => csv_io::read_rr_csv(path, column, unit),
        (Some(path), None) => text_io::read_rr_series(path, unit),
        (None, _) => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_rr_series(&buf, unit)
        }
    }
}

/// The trailing `window_span_s` seconds of `rr`, as the live buffer would hold it.
fn trailing_window(rr: &RRSeries, cfg: &AnalysisConfig) -> RRSeries {
    let mut buffer = IntervalBuffer::new(cfg.window_span_s);
    buffer.append(&rr.rr);
    buffer.snapshot()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn cmd_lf_hf(
    cfg: &AnalysisConfig,
    input: Option<&Path>,
    unit: RrUnit,
    csv_column: Option<&str>,
    whole: bool,
) -> Result<()> {
    let rr = read_rr(input, unit, csv_column)?;
    let series = if whole { rr } else { trailing_window(&rr, cfg) };
    let result = hrv_lf_hf(&series, cfg);
    print_json(&LfHfReport::new(series.len(), result))
}

fn cmd_monitor(
    cfg: AnalysisConfig,
    input: &Path,
    session_out: Option<&Path>,
    flush_interval_s: f64,
) -> Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let mut monitor = Monitor::new(cfg).with_flush_interval(flush_interval_s);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut skipped = 0usize;
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let payload = match parse_hex_payload(trimmed) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("line {}: {}", idx + 1, err);
                skipped += 1;
                continue;
            }
        };
        let update = match monitor.ingest_payload(&payload) {
            Ok(update) => update,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        writeln!(out, "{}", serde_json::to_string(&update)?)?;
        if update.flush_due {
            if let Some(path) = session_out {
                monitor.flush(path)?;
            }
        }
    }
    out.flush()?;
    if let Some(path) = session_out {
        monitor.flush(path)?;
    }
    info!(
        "monitor finished: {} notification(s) recorded, {} skipped",
        monitor.session().len(),
        skipped
    );
    Ok(())
}

fn cmd_replay_session(cfg: AnalysisConfig, input: &Path) -> Result<()> {
    let records = read_session_log(input)?;
    let mut monitor = Monitor::new(cfg);
    for record in &records {
        monitor.ingest_record(record.heart_rate, record.rr.clone());
    }
    print_json(&ReplayReport {
        records: records.len(),
        buffered: monitor.buffer().len(),
        result: monitor.analyze(),
    })
}

fn cmd_simulate(beats: usize, seed: u64, modulation_hz: f64, out: Option<&Path>) -> Result<()> {
    let sim = SimulationConfig {
        beats,
        seed,
        modulation_hz,
        ..SimulationConfig::default()
    };
    let samples = simulate_notifications(&sim);
    let mut text = format!(
        "# simulated heart rate notifications: {} beats, seed {}, modulation {} Hz\n",
        beats, seed, modulation_hz
    );
    for sample in &samples {
        text.push_str(&to_hex(&sample.to_payload()));
        text.push('\n');
    }
    match out {
        Some(path) => {
            fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
            info!("wrote {} notification(s) to {}", samples.len(), path.display());
        }
        None => io::stdout().write_all(text.as_bytes())?,
    }
    Ok(())
}

fn cmd_psd_plot(
    cfg: &AnalysisConfig,
    input: Option<&Path>,
    unit: RrUnit,
    out: &Path,
    max_freq: f64,
) -> Result<()> {
    let rr = read_rr(input, unit, None)?;
    let series = trailing_window(&rr, cfg);
    let psd = hrv_psd(&series, cfg).with_context(|| {
        format!(
            "a spectrum needs at least {} intervals in the window, got {}",
            cfg.min_samples,
            series.len()
        )
    })?;
    let fig = figure_from_spectrum(&psd.spectrum, &cfg.lf_band, &cfg.hf_band, max_freq);
    draw_plotters_figure(out, &fig)?;
    print_json(&LfHfReport::new(psd.n, psd.result()))
}

fn cmd_pacer(rate: f64, duration_s: f64) -> Result<()> {
    let mut pacer = BreathingPacer::new(rate)?;
    let ticks = (duration_s * 1000.0 / DEFAULT_TICK_MS).round() as usize;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for _ in 0..ticks {
        writeln!(out, "{}", serde_json::to_string(&pacer.tick())?)?;
    }
    out.flush()?;
    Ok(())
}

fn draw_plotters_figure(path: &Path, fig: &Figure) -> Result<()> {
    let backend = BitMapBackend::new(path, (800, 480));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let (x_min, x_max, y_min, y_max) = fig.bounds();
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    chart
        .configure_mesh()
        .x_desc(fig.x.label.clone().unwrap_or_default())
        .y_desc(fig.y.label.clone().unwrap_or_default())
        .draw()?;
    for series in &fig.series {
        match series {
            Series::Line(line) => {
                let (r, g, b) = line.style.color.rgb();
                let color = RGBColor(r, g, b);
                let width = line.style.width.round().max(1.0) as u32;
                chart
                    .draw_series(LineSeries::new(
                        line.points.iter().map(|p| (p[0], p[1])),
                        color.stroke_width(width),
                    ))?
                    .label(line.name.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
        }
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
