//! Config command - manage configuration.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use prospex_core::EngineConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the current configuration
    Show {
        /// Configuration file to show (default: built-in defaults)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Initialize a new configuration file with defaults
    Init(InitArgs),
}

#[derive(Args)]
struct InitArgs {
    /// Output path for the configuration file
    #[arg(short, long, default_value = "prospex.json")]
    output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { path } => show_config(path.as_deref()),
        ConfigCommand::Init(init_args) => init_config(init_args),
    }
}

fn show_config(path: Option<&Path>) -> anyhow::Result<()> {
    let config = match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => {
            println!(
                "{} No config file given, showing defaults.",
                style("ℹ").blue()
            );
            EngineConfig::default()
        }
    };

    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(args: InitArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            args.output.display()
        );
    }

    EngineConfig::default().save(&args.output)?;
    println!(
        "{} Config written to {}",
        style("✓").green(),
        args.output.display()
    );

    Ok(())
}
