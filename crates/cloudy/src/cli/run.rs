//! The `cloudy run` command: benchmark the corpus and write the reports.

use clap::{Args, ValueEnum};
use cloudy_core::{
    AdapterSettings, BenchmarkRun, Config, Credentials, CsvExport, GroundTruth, JsonReport,
    Orchestrator, OutputFormat as CoreOutputFormat, ReportSink, StatValue, VendorRegistry,
};
use cloudy_core::pipeline::FileDiscovery;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Supported report formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// One pretty-printed JSON document
    Json,
    /// One JSON object per image, then a summary line
    Jsonl,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Arguments for the `run` command.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Directory of corpus images
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for cached results, output images and reports
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Ground-truth tags file (JSON object: file name -> tags)
    #[arg(long)]
    pub tags: Option<PathBuf>,

    /// Skip matching against ground truth
    #[arg(long)]
    pub no_ground_truth: bool,

    /// Vendor to benchmark (repeatable; defaults to the configured set)
    #[arg(long = "vendor", value_name = "NAME")]
    pub vendors: Vec<String>,

    /// Delay after each live vendor call, in milliseconds
    #[arg(long)]
    pub rate_limit_ms: Option<u64>,

    /// Report format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Do not write the CSV export
    #[arg(long)]
    pub no_csv: bool,
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(ref input) = args.input {
        config.general.input_dir = input.clone();
    }
    if let Some(ref output) = args.output {
        config.general.output_dir = output.clone();
    }
    if let Some(ref tags) = args.tags {
        config.ground_truth.path = tags.clone();
    }
    if args.no_ground_truth {
        config.ground_truth.enabled = false;
    }
    if !args.vendors.is_empty() {
        config.vendors.enabled = args.vendors.clone();
    }
    if let Some(ms) = args.rate_limit_ms {
        config.pipeline.rate_limit_ms = ms;
    }
    if let Some(format) = args.format {
        config.output.format = format.to_string();
    }
    if args.no_csv {
        config.output.csv = false;
    }
}

/// Execute the run command.
pub async fn execute(args: RunArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let keys_path = config.keys_path();
    if !keys_path.exists() {
        anyhow::bail!(
            "API keys file not found: {}\n\n  Hint: Create it as a JSON object of vendor name -> key, \
             or point [credentials] keys_path at it.",
            keys_path.display()
        );
    }
    let credentials = Credentials::load(&keys_path, &config.regions_path())?;

    let registry = VendorRegistry::builtin(&AdapterSettings::from_config(&config))
        .select(&config.vendors.enabled)?;
    registry.check_credentials(&credentials)?;

    let mut orchestrator = Orchestrator::new(&config, registry, credentials)?;
    if config.ground_truth.enabled {
        let ground_truth = GroundTruth::load(&config.ground_truth_path())?;
        tracing::info!("Loaded ground truth for {} images", ground_truth.len());
        orchestrator = orchestrator.with_ground_truth(ground_truth);
    }

    let files = orchestrator.discover()?;
    if files.is_empty() {
        tracing::warn!("No supported images found in {:?}", config.input_dir());
        return Ok(());
    }
    tracing::info!(
        "Found {} image(s) ({:.1} MB), vendors: {}",
        files.len(),
        FileDiscovery::total_size(&files) as f64 / 1_000_000.0,
        orchestrator.vendors().names().collect::<Vec<_>>().join(", ")
    );

    let progress = create_progress_bar(files.len() as u64);
    let run = orchestrator
        .run_on(&files, |image| {
            progress.set_message(image.output_filename.clone());
            progress.inc(1);
        })
        .await?;
    progress.finish_and_clear();

    let format = CoreOutputFormat::parse(&config.output.format).unwrap_or(CoreOutputFormat::Json);
    let mut sinks: Vec<Box<dyn ReportSink>> =
        vec![Box::new(JsonReport::new(config.output_dir(), format))];
    if config.output.csv {
        sinks.push(Box::new(CsvExport::new(config.output_dir())));
    }
    for sink in &sinks {
        let path = sink.emit(&run)?;
        tracing::info!("Wrote {} report to {}", sink.name(), path.display());
    }

    eprint!("{}", format_summary(&run));
    Ok(())
}

/// Create a progress bar for the image loop.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    )
    .map(|s| s.progress_chars("##-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

fn format_stat(mean: StatValue, stdev: StatValue) -> String {
    match (mean.value(), stdev.value()) {
        (Some(m), Some(s)) => format!("{m:.3} ± {s:.3}"),
        _ => "undefined".to_string(),
    }
}

/// Run counters plus one row per vendor with `mean ± stdev` per metric.
fn format_summary(run: &BenchmarkRun) -> String {
    let stats = &run.run_stats;
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(out, "  ====================================");
    let _ = writeln!(out, "               Summary");
    let _ = writeln!(out, "  ====================================");
    let _ = writeln!(out, "    Images:       {:>8}", stats.images);
    let _ = writeln!(out, "    Live calls:   {:>8}", stats.live_calls);
    let _ = writeln!(out, "    Cache hits:   {:>8}", stats.cache_hits);
    if stats.failed_calls > 0 {
        let _ = writeln!(out, "    Failed:       {:>8}", stats.failed_calls);
    }
    let _ = writeln!(out, "    Duration:     {:>7.1}s", stats.total_seconds);
    let _ = writeln!(out, "  ------------------------------------");

    let mut header = format!("    {:<12}", "vendor");
    for metric in &run.metrics {
        let _ = write!(header, " {:>22}", metric.name());
    }
    let _ = writeln!(out, "{header}");
    for (vendor, summary) in &run.vendor_stats {
        let mut row = format!("    {vendor:<12}");
        for stat in &summary.stats {
            let _ = write!(row, " {:>22}", format_stat(stat.mean, stat.stdev));
        }
        if summary.failed_calls > 0 {
            let _ = write!(row, "  ({} failed)", summary.failed_calls);
        }
        let _ = writeln!(out, "{row}");
    }
    let _ = writeln!(out, "  ====================================");
    out
}
