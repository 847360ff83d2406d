#![forbid(unsafe_code)]
use clap::Parser;
use colored::*;
use std::fs;
use std::path::Path;
use tallychain::config::load_config;
use tallychain::document::Level;
use tallychain::engine::process_document;
use tracing::error;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Level prefix selecting which input files to process (e.g. level3)
    level: String,
    /// Override the configured input directory
    #[arg(long)]
    input: Option<String>,
    /// Override the configured output directory
    #[arg(long)]
    output: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config()?;

    let level = Level::from_name(&cli.level)
        .ok_or_else(|| format!("unknown level: {}", cli.level))?;
    let input_dir = cli.input.unwrap_or(config.io.input_dir);
    let output_dir = cli.output.unwrap_or(config.io.output_dir);

    let mut names: Vec<String> = fs::read_dir(&input_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(&cli.level))
        .collect();
    names.sort();

    if names.is_empty() {
        println!(
            "{}",
            format!("No {} files found in {}", cli.level, input_dir).yellow()
        );
        return Ok(());
    }

    let mut failures = 0;
    for name in &names {
        println!("processing {}...", name.bright_yellow());

        let text = fs::read_to_string(Path::new(&input_dir).join(name))?;
        match process_document(level, &text, &config.engine) {
            Ok(result) => {
                println!("{}", "--- OUTPUT ---".bright_cyan());
                println!("{}", result);
                println!();

                fs::create_dir_all(&output_dir)?;
                fs::write(Path::new(&output_dir).join(name), &result)?;
            }
            Err(err) => {
                // A conservation violation (or parse failure) fails this
                // document outright; no partial output is written.
                error!("{}: {}", name, err);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} document(s) failed", failures).into());
    }
    Ok(())
}
