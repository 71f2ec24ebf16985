use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::bench::{self, BenchPlan, BenchRequest, ModeKind, SystemRunner};
use crate::config::Config;
use crate::error::BenchError;

const LONG_ABOUT: &str = "\
Compare the performance of code changes for a PDF.

Runs the PDF test harness twice and compares the two statistics files.

Modes:
  stash    Benchmark the working tree, stash local changes to build a
           baseline, then restore them.
  commits  Benchmark two commits. Give the ids with --current and --baseline.";

#[derive(Parser, Debug)]
#[command(
    name = "pdfbench",
    about = "A/B performance comparison of the PDF test harness",
    long_about = LONG_ABOUT,
    version,
    author
)]
pub struct Cli {
    /// PDF file to benchmark
    pub pdf: Option<PathBuf>,

    /// Comparison mode
    #[arg(short = 'm', long, value_enum, default_value_t = ModeArg::Stash)]
    pub mode: ModeArg,

    /// Baseline commit id for commits mode
    #[arg(short = 'b', long)]
    pub baseline: Option<String>,

    /// Current commit id for commits mode
    #[arg(short = 'c', long)]
    pub current: Option<String>,

    /// Last page to run
    #[arg(
        short = 'l',
        long = "last_page",
        alias = "last-page",
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub last_page: u32,

    /// Rounds to run
    #[arg(
        short = 'r',
        long,
        default_value_t = 20,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub rounds: u32,

    /// Path to the test directory
    #[arg(short = 't', long = "test_path", alias = "test-path", default_value = ".")]
    pub test_path: PathBuf,

    /// Show the workspace, manifest and commands without running anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<clap_complete::Shell>,

    /// Print the CLI reference as Markdown
    #[arg(long, hide = true)]
    pub markdown_help: bool,

    /// Write man pages to a directory
    #[arg(long, hide = true, value_name = "DIR")]
    pub generate_man_pages: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Working tree against stashed baseline
    Stash,
    /// Two named commits
    Commits,
}

impl From<ModeArg> for ModeKind {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Stash => ModeKind::Stash,
            ModeArg::Commits => ModeKind::Commits,
        }
    }
}

impl Cli {
    /// Benchmark options, or `None` when no PDF was given.
    pub fn request(&self) -> Option<BenchRequest> {
        let pdf = self.pdf.clone()?;
        Some(BenchRequest {
            pdf,
            mode: self.mode.into(),
            baseline: self.baseline.clone(),
            current: self.current.clone(),
            last_page: self.last_page,
            rounds: self.rounds,
            test_path: self.test_path.clone(),
        })
    }
}

pub fn run(cli: Cli) -> Result<()> {
    if let Some(shell) = cli.completions {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "pdfbench",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    if let Some(dir) = &cli.generate_man_pages {
        return generate_man_pages(dir);
    }

    let Some(request) = cli.request() else {
        Cli::command().print_help()?;
        println!();
        return Err(BenchError::MissingPdf.into());
    };

    request.check_pdf()?;
    let config =
        Config::load_from_dir(&request.test_path).map_err(|source| BenchError::InvalidConfig {
            dir: request.test_path.clone(),
            source: source.into(),
        })?;
    let plan = BenchPlan::validate(request, config)?;

    if cli.dry_run {
        return print_dry_run(&plan);
    }

    println!(
        "{} {} ({} mode, {} rounds, last page {})",
        "Benchmarking".green().bold(),
        plan.pdf_name.white().bold(),
        plan.mode.name(),
        plan.rounds,
        plan.last_page
    );

    let report = bench::run(&plan, &mut SystemRunner)?;

    println!("\n{}", "Done!".green().bold());
    println!(
        "  {} {}",
        "Baseline:".bold(),
        report.baseline_stats.display()
    );
    println!("  {} {}", "Current:".bold(), report.current_stats.display());
    Ok(())
}

fn generate_man_pages(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create man page dir: {}", dir.display()))?;
    clap_mangen::generate_to(Cli::command(), dir)
        .with_context(|| format!("Failed to write man pages to {}", dir.display()))?;
    println!("{} {}", "Man pages written to".green(), dir.display());
    Ok(())
}

fn print_dry_run(plan: &BenchPlan) -> Result<()> {
    println!("{}", "Dry run - nothing will be executed".yellow().bold());

    println!("\n{}", "Workspace:".yellow().bold());
    println!("  {}", plan.workspace.root().display());

    println!("\n{}", "Manifest:".yellow().bold());
    let manifest = serde_json::to_string_pretty(&[plan.manifest_entry()])
        .context("Failed to serialize manifest")?;
    for line in manifest.lines() {
        println!("  {}", line);
    }

    println!("\n{}", "Commands:".yellow().bold());
    for (i, step) in bench::plan_steps(plan).iter().enumerate() {
        println!(
            "  {}. {} {}",
            i + 1,
            step.kind.to_string().bold(),
            step.invocation.to_string().dimmed()
        );
    }
    println!();
    Ok(())
}
