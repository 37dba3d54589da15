//! sfbank CLI - The `sfbank` command.
//!
//! Inspects SoundFont 2 banks and exports their samples.
//!
//! # Architecture
//!
//! All decoding lives in **sfbank-core**; this binary only loads files,
//! prints what it finds and writes export output.

mod export;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sfbank_core::{load_soundfont, Diagnostics, LogSink};
use std::path::PathBuf;

/// sfbank - SoundFont 2 bank inspector
#[derive(Parser, Debug)]
#[command(name = "sfbank")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and export SoundFont 2 banks", long_about = None)]
struct Args {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a summary of a bank
    Info {
        /// Path to the .sf2 file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// List every preset
        #[arg(long)]
        presets: bool,

        /// Print decode warnings
        #[arg(long)]
        warnings: bool,
    },

    /// Write preset samples as WAV files with JSON metadata
    Export {
        /// Path to the .sf2 file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Only export presets with this name (repeatable)
        #[arg(short, long = "preset", value_name = "NAME")]
        presets: Vec<String>,
    },

    /// Show version information
    Version,
}

fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    match args.command {
        Commands::Info {
            file,
            presets,
            warnings,
        } => info(file, presets, warnings),
        Commands::Export {
            file,
            output,
            presets,
        } => {
            let font = load_soundfont(&file, &mut LogSink)?;
            export::export(&font, &export::ExportArgs { output, presets })?;
            Ok(())
        }
        Commands::Version => {
            println!("sfbank {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("SoundFont 2 bank inspector and sample exporter");
            Ok(())
        }
    }
}

fn info(file: PathBuf, list_presets: bool, show_warnings: bool) -> Result<()> {
    let mut diagnostics = Diagnostics::new();
    let font = load_soundfont(&file, &mut diagnostics)?;

    print!("{}", font);

    if list_presets {
        println!();
        println!("Presets:");
        for preset in &font.presets {
            println!(
                "  {:03}:{:03} {} ({} zones)",
                preset.bank,
                preset.preset,
                preset.name,
                preset.zones.len()
            );
        }
    }

    if show_warnings {
        println!();
        println!("Warnings ({}):", diagnostics.len());
        for warning in diagnostics.warnings() {
            println!("  {}", warning);
        }
    } else if !diagnostics.is_empty() {
        log::info!(
            "{} decode warnings (use --warnings to list them)",
            diagnostics.len()
        );
    }

    Ok(())
}
