//! Report output: JSON / JSONL serialization and the report sinks.
//!
//! A [`ReportSink`] receives the finished run (image records in output
//! order, per-vendor statistics and the run timestamp). Two sinks ship with
//! the library: [`JsonReport`] and [`CsvExport`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::CloudyError;
use crate::pipeline::BenchmarkRun;
use crate::stats::{Metric, VendorSummary};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }

    /// File extension for reports in this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::JsonLines => "jsonl",
        }
    }
}

/// A writer that serializes items to JSON or JSONL format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    ///
    /// `pretty` only affects the JSON format.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write a single item.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        match self.format {
            OutputFormat::Json if self.pretty => {
                serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
            }
            // JSONL is never pretty-printed (one object per line)
            _ => serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?,
        }
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    /// Get the number of items written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Consumer of a finished benchmark run.
pub trait ReportSink {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// Write the report, returning where it went.
    fn emit(&self, run: &BenchmarkRun) -> Result<PathBuf, CloudyError>;
}

/// Closing line of a JSONL report.
#[derive(Serialize)]
struct Summary<'a> {
    generated_at: DateTime<Utc>,
    vendors: &'a [String],
    metrics: &'a [Metric],
    ground_truth: bool,
    vendor_stats: &'a BTreeMap<String, VendorSummary>,
}

/// The full run as `report.json` (one pretty document) or `report.jsonl`
/// (one line per image, then a summary line).
pub struct JsonReport {
    dir: PathBuf,
    format: OutputFormat,
}

impl JsonReport {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("report.{}", self.format.extension()))
    }
}

impl ReportSink for JsonReport {
    fn name(&self) -> &str {
        "json"
    }

    fn emit(&self, run: &BenchmarkRun) -> Result<PathBuf, CloudyError> {
        let path = self.path();
        let file = create(&path)?;
        let mut writer = OutputWriter::new(BufWriter::new(file), self.format, true);
        match self.format {
            OutputFormat::Json => writer.write(run)?,
            OutputFormat::JsonLines => {
                for image in &run.images {
                    writer.write(image)?;
                }
                writer.write(&Summary {
                    generated_at: run.generated_at,
                    vendors: &run.vendors,
                    metrics: &run.metrics,
                    ground_truth: run.ground_truth,
                    vendor_stats: &run.vendor_stats,
                })?;
            }
        }
        writer.flush()?;
        tracing::debug!("Wrote {} report items to {:?}", writer.items_written(), path);
        Ok(path)
    }
}

/// One row per (image, vendor) pair.
#[derive(Serialize)]
struct CsvRow<'a> {
    image_name: &'a str,
    image_tags: String,
    vendor_name: &'a str,
    response_time: f64,
    tags_count: usize,
    matching_tags_count: usize,
    matching_confidence: Option<f64>,
    error: Option<&'a str>,
}

/// Tabular export as `results.csv`.
pub struct CsvExport {
    dir: PathBuf,
}

impl CsvExport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join("results.csv")
    }
}

impl ReportSink for CsvExport {
    fn name(&self) -> &str {
        "csv"
    }

    fn emit(&self, run: &BenchmarkRun) -> Result<PathBuf, CloudyError> {
        let path = self.path();
        let mut writer = csv::Writer::from_writer(create(&path)?);
        let csv_error = |e: csv::Error| CloudyError::Report(format!("CSV export failed: {e}"));

        for image in &run.images {
            let image_tags = image
                .ground_truth_tags
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(";");
            for record in &image.vendor_results {
                writer
                    .serialize(CsvRow {
                        image_name: &image.output_filename,
                        image_tags: image_tags.clone(),
                        vendor_name: &record.vendor_name,
                        response_time: record.response_time,
                        tags_count: record.tags_count,
                        matching_tags_count: record.matching_tags_count,
                        matching_confidence: record.matching_confidence,
                        error: record.error.as_deref(),
                    })
                    .map_err(csv_error)?;
            }
        }
        writer.flush()?;
        Ok(path)
    }
}

fn create(path: &Path) -> Result<File, CloudyError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}
