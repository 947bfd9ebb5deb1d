//! Process command - extract facts from a single prospectus file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use prospex_core::{Document, EngineConfig, ExtractionEngine, ExtractionRecord};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input text file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show per-field confidence scores
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output (one row per record)
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let engine = ExtractionEngine::new(config)?;
    let record = extract_file(&engine, &args.input)?;

    if !record.validation_flags.is_empty() {
        eprintln!("{}", style("Validation flags:").yellow());
        for flag in &record.validation_flags {
            eprintln!("  - {}", flag);
        }
    }

    let output = format_record(&record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        println!();
        for (field, confidence) in &record.confidence {
            println!(
                "{} {}: {:.0}%",
                style("ℹ").blue(),
                field,
                confidence * 100.0
            );
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Load engine configuration from an explicit path, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<EngineConfig> {
    match config_path {
        Some(path) => Ok(EngineConfig::from_file(Path::new(path))?),
        None => Ok(EngineConfig::default()),
    }
}

/// Read one text file and run the engine over it.
pub fn extract_file(engine: &ExtractionEngine, path: &Path) -> anyhow::Result<ExtractionRecord> {
    let text = fs::read_to_string(path)?;
    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();
    let document = Document::new(id, text).with_source(path.display().to_string());
    Ok(engine.extract(&document))
}

/// Render a record in the requested output format.
pub fn format_record(record: &ExtractionRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(csv_header())?;
            writer.write_record(csv_row(record))?;
            Ok(String::from_utf8(writer.into_inner()?)?)
        }
        OutputFormat::Text => Ok(text_summary(record)),
    }
}

pub fn csv_header() -> Vec<String> {
    [
        "document_id",
        "issuer",
        "banks",
        "issue_size",
        "currency",
        "issue_date",
        "maturity_date",
        "coupon_rate",
        "flags",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn csv_row(record: &ExtractionRecord) -> Vec<String> {
    let banks = record
        .banks
        .iter()
        .map(|b| {
            b.bank
                .standard_name
                .clone()
                .unwrap_or_else(|| b.bank.raw_name.clone())
        })
        .collect::<Vec<_>>()
        .join("; ");

    vec![
        record.document_id.clone(),
        record.issuer.clone().unwrap_or_default(),
        banks,
        record
            .issue_size
            .map(|d| d.to_string())
            .unwrap_or_default(),
        record.currency.clone().unwrap_or_default(),
        record
            .issue_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        record
            .maturity_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        record
            .coupon_rate
            .map(|d| d.to_string())
            .unwrap_or_default(),
        record.validation_flags.join("; "),
    ]
}

fn text_summary(record: &ExtractionRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("Document:      {}\n", record.document_id));
    out.push_str(&format!(
        "Issuer:        {}\n",
        record.issuer.as_deref().unwrap_or("-")
    ));
    if record.banks.is_empty() {
        out.push_str("Banks:         -\n");
    } else {
        out.push_str("Banks:\n");
        for entry in &record.banks {
            let name = entry
                .bank
                .standard_name
                .as_deref()
                .unwrap_or(&entry.bank.raw_name);
            out.push_str(&format!(
                "  - {} ({:?}, {:.0}%)\n",
                name,
                entry.role,
                entry.bank.confidence * 100.0
            ));
        }
    }
    out.push_str(&format!(
        "Issue size:    {} {}\n",
        record.currency.as_deref().unwrap_or("-"),
        record
            .issue_size
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    out.push_str(&format!(
        "Issue date:    {}\n",
        record
            .issue_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    out.push_str(&format!(
        "Maturity date: {}\n",
        record
            .maturity_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    out.push_str(&format!(
        "Coupon:        {}\n",
        record
            .coupon_rate
            .map(|d| format!("{}%", d))
            .unwrap_or_else(|| "-".to_string())
    ));
    if !record.validation_flags.is_empty() {
        out.push_str(&format!(
            "Flags:         {}\n",
            record.validation_flags.join(", ")
        ));
    }
    out
}
