//! Batch processing command for multiple prospectus files.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use prospex_core::{ExtractionEngine, ExtractionRecord};

use super::process::{csv_header, csv_row, extract_file, format_record, load_config, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    record: Option<ExtractionRecord>,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let engine = ExtractionEngine::new(config)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "txt" | "text")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // A file that cannot be read or written is reported and skipped; the
    // engine itself never fails on document content.
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let result = match extract_file(&engine, &path) {
            Ok(record) => FileResult {
                path,
                record: Some(record),
                error: None,
            },
            Err(e) => {
                warn!("Failed to process {}: {}", path.display(), e);
                FileResult {
                    path,
                    record: None,
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(result);
        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    for result in &results {
        let (Some(record), Some(output_dir)) = (&result.record, &args.output_dir) else {
            continue;
        };
        let stem = result
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("record");
        let extension = match args.format {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        };
        let output_path = output_dir.join(format!("{stem}.{extension}"));
        fs::write(&output_path, format_record(record, args.format)?)?;
        debug!("Wrote {}", output_path.display());
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("summary.csv");
        write_summary(&results, &summary_path)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let succeeded = results.iter().filter(|r| r.record.is_some()).count();
    let failed = results.len() - succeeded;
    println!(
        "{} Processed {} files ({} failed) in {:?}",
        style("✓").green(),
        succeeded,
        failed,
        start.elapsed()
    );
    for result in results.iter().filter(|r| r.error.is_some()) {
        eprintln!(
            "  {} {}: {}",
            style("✗").red(),
            result.path.display(),
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}

fn write_summary(results: &[FileResult], path: &PathBuf) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(csv_header())?;
    for record in results.iter().filter_map(|r| r.record.as_ref()) {
        writer.write_record(csv_row(record))?;
    }
    writer.flush()?;
    Ok(())
}
