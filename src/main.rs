use clap::Parser as ClapParser;
use colored::Colorize;
use pdfbench::cli::{self, Cli};
use pdfbench::error::{BenchError, ErrorKind, EXIT_FAILURE};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli_args = Cli::parse();

    let default_level = if cli_args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli::run(cli_args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let bench_err = err.downcast_ref::<BenchError>();
            // Help has already been printed for a missing PDF.
            if bench_err.map(BenchError::kind) != Some(ErrorKind::Usage) {
                eprintln!("{} {:#}", "error:".red().bold(), err);
            }
            if let Some(hint) = bench_err.and_then(BenchError::recovery_hint) {
                eprintln!("  {} {}", "hint:".yellow().bold(), hint);
            }
            ExitCode::from(bench_err.map_or(EXIT_FAILURE, BenchError::exit_code))
        }
    }
}
