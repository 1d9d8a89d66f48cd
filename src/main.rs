use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use srtb_meta::{audio, scan, Chart, DifficultyTier};

#[derive(Parser, Debug)]
#[command(author, version, about = "Metadata extractor for SRTB chart files", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a single chart file and print its metadata
    Parse {
        /// Path to the .srtb chart file
        file: PathBuf,

        /// Print the chart as pretty JSON
        #[arg(long)]
        json: bool,

        /// Skip probing the sidecar audio clip for its duration
        #[arg(long)]
        no_audio: bool,
    },
    /// Parse every chart file directly under a directory
    Scan {
        /// Directory containing .srtb chart files
        dir: PathBuf,

        /// Print the charts as a pretty JSON array
        #[arg(long)]
        json: bool,

        /// Skip probing sidecar audio clips for durations
        #[arg(long)]
        no_audio: bool,

        /// Stop after this many chart files
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_default_env()
        .filter_level(level.parse()?)
        .init();

    match args.command {
        Command::Parse {
            file,
            json,
            no_audio,
        } => {
            let mut chart = srtb_meta::load_path(&file)?;
            if !no_audio {
                audio::enrich(&mut chart);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&chart)?);
            } else {
                print_chart(&chart);
            }
        }
        Command::Scan {
            dir,
            json,
            no_audio,
            limit,
        } => {
            let mut scanned = scan::scan_charts(&dir);
            if let Some(limit) = limit {
                scanned.truncate(limit);
            }

            let total = scanned.len();
            let mut charts: Vec<Chart> = Vec::new();
            for entry in scanned {
                // Failures were already logged by the scanner.
                if let Ok(mut chart) = entry.result {
                    if !no_audio {
                        audio::enrich(&mut chart);
                    }
                    charts.push(chart);
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&charts)?);
            } else {
                for chart in &charts {
                    print_chart(chart);
                }
            }

            let failed = total - charts.len();
            log::info!("scanned {total} chart files, {failed} failed");
            if charts.is_empty() && failed > 0 {
                anyhow::bail!("no chart in {} could be parsed", dir.display());
            }
        }
    }

    Ok(())
}

fn print_chart(chart: &Chart) {
    println!("\n=== {} ===", chart.title);
    if !chart.subtitle.is_empty() {
        println!("subtitle : {}", chart.subtitle);
    }
    println!("artist   : {}", chart.artist);
    println!("charter  : {}", chart.charter);
    for tier in DifficultyTier::ALL {
        let slot = chart.difficulty(tier);
        if slot.defined {
            println!("{:<9}: {}", tier.name(), slot.level);
        }
    }
    match chart.clip_duration_seconds {
        Some(secs) => println!("clip     : {} ({}s)", chart.clip_asset_name, secs),
        None => println!("clip     : {}", chart.clip_asset_name),
    }
    println!("file     : {}", chart.file_reference);
}
