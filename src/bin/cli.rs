#![cfg(not(tarpaulin_include))]

use env_logger::Env;
use sentiscope::classify::AnalysisMode;
use sentiscope::sentiment::LexiconScorer;
use sentiscope::{downloader, loader, report};
use std::env;
use std::io::{self, Write};
use std::process::ExitCode;

/// Label every row of a CSV file and print the result as CSV
///
/// Usage: `sentiscope-cli <file.csv> [sentiment|emotion]`
fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <file.csv> [sentiment|emotion]", program_name(&args));
        return ExitCode::from(2);
    }

    let mode = match args.get(2) {
        Some(name) => match AnalysisMode::from_name(name) {
            Some(mode) => mode,
            None => {
                eprintln!("Error: unknown mode {:?}, expected sentiment or emotion", name);
                return ExitCode::from(2);
            }
        },
        None => AnalysisMode::default(),
    };

    match run(&args[1], mode) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Name to show in the usage line; argv may be empty
fn program_name(args: &[String]) -> &str {
    args.first().map_or("sentiscope-cli", String::as_str)
}

fn run(path: &str, mode: AnalysisMode) -> Result<(), Box<dyn std::error::Error>> {
    let mut table = loader::from_path(path)?;
    report::analyze_table(&LexiconScorer::new(), &mut table, mode)?;
    log::info!("labelled {} rows from {} ({})", table.len(), path, mode);

    let mut stdout = io::stdout().lock();
    stdout.write_all(&downloader::to_csv(&table))?;
    stdout.flush()?;
    Ok(())
}
