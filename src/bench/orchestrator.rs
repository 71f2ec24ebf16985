//! Benchmark orchestrator - runs both code states and compares them

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::command::{CommandRunner, Invocation};
use super::manifest::write_manifest;
use super::workspace::{StatsVariant, Workspace, MANIFEST_FILE};
use super::{BenchPlan, Mode};
use crate::error::{BenchError, BenchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    CheckoutCurrent,
    CurrentRun,
    StashSave,
    CheckoutBaseline,
    BaselineRun,
    StashPop,
    Compare,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepKind::CheckoutCurrent => "checkout current",
            StepKind::CurrentRun => "run harness (current)",
            StepKind::StashSave => "stash local changes",
            StepKind::CheckoutBaseline => "checkout baseline",
            StepKind::BaselineRun => "run harness (baseline)",
            StepKind::StashPop => "restore stashed changes",
            StepKind::Compare => "compare statistics",
        };
        f.write_str(label)
    }
}

/// What the run has done to the version-controlled working tree so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeState {
    Untouched,
    CheckedOut(String),
    Stashed,
    Restored,
}

impl TreeState {
    pub fn recovery_hint(&self) -> Option<String> {
        match self {
            TreeState::Untouched | TreeState::Restored => None,
            TreeState::CheckedOut(id) => Some(format!(
                "working tree is checked out at `{id}`; check out your original branch"
            )),
            TreeState::Stashed => {
                Some("local changes are still stashed; run `git stash pop`".to_string())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Step {
    pub kind: StepKind,
    pub invocation: Invocation,
    /// Tree state once this step succeeds, when it changes
    pub leaves: Option<TreeState>,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub workspace: Workspace,
    pub baseline_stats: PathBuf,
    pub current_stats: PathBuf,
    pub steps_run: usize,
}

/// External commands for a plan, in execution order.
pub fn plan_steps(plan: &BenchPlan) -> Vec<Step> {
    let config = &plan.config;
    let dir = plan.test_dir.as_path();
    let manifest = plan.workspace.relative().join(MANIFEST_FILE);

    let harness = |variant: StatsVariant| {
        Invocation::new(&config.python, dir)
            .arg(&config.harness)
            .arg(format!("--browserManifestFile={}", config.browser_manifest))
            .arg(format!("--manifestFile={}", manifest.display()))
            .arg(format!(
                "--statsFile={}",
                plan.workspace.stats_path(variant).display()
            ))
    };
    let git = |args: &[&str]| Invocation::new(&config.git, dir).args(args.iter().copied());

    let mut steps = Vec::with_capacity(6);

    if let Mode::Commits { current, .. } = &plan.mode {
        steps.push(Step {
            kind: StepKind::CheckoutCurrent,
            invocation: git(&["checkout", current.as_str()]),
            leaves: Some(TreeState::CheckedOut(current.clone())),
        });
    }

    steps.push(Step {
        kind: StepKind::CurrentRun,
        invocation: harness(StatsVariant::Current),
        leaves: None,
    });

    match &plan.mode {
        Mode::Commits { baseline, .. } => steps.push(Step {
            kind: StepKind::CheckoutBaseline,
            invocation: git(&["checkout", baseline.as_str()]),
            leaves: Some(TreeState::CheckedOut(baseline.clone())),
        }),
        Mode::Stash => steps.push(Step {
            kind: StepKind::StashSave,
            invocation: git(&["stash", "save"]),
            leaves: Some(TreeState::Stashed),
        }),
    }

    steps.push(Step {
        kind: StepKind::BaselineRun,
        invocation: harness(StatsVariant::Baseline),
        leaves: None,
    });

    if plan.mode == Mode::Stash {
        steps.push(Step {
            kind: StepKind::StashPop,
            invocation: git(&["stash", "pop"]),
            leaves: Some(TreeState::Restored),
        });
    }

    steps.push(Step {
        kind: StepKind::Compare,
        invocation: Invocation::new(&config.python, dir)
            .arg(&config.comparator)
            .arg(plan.workspace.stats_path(StatsVariant::Baseline).display().to_string())
            .arg(plan.workspace.stats_path(StatsVariant::Current).display().to_string()),
        leaves: None,
    });

    steps
}

/// Prepare the workspace, run every step in order and remove the PDF copy.
///
/// The first failing command ends the run. Nothing is restored afterwards;
/// the returned error carries the tree state so the caller can say what is
/// left to undo.
pub fn run(plan: &BenchPlan, runner: &mut dyn CommandRunner) -> BenchResult<RunReport> {
    let workspace = &plan.workspace;

    println!(
        "{} Creating dir: {}",
        "🔧".yellow(),
        workspace.root().display().to_string().dimmed()
    );
    workspace.prepare(&plan.pdf)?;

    let manifest_path = workspace.manifest_path();
    write_manifest(&manifest_path, &[plan.manifest_entry()])?;
    info!(
        pdf = %plan.pdf_name,
        mode = plan.mode.name(),
        rounds = plan.rounds,
        last_page = plan.last_page,
        manifest = %manifest_path.display(),
        "workspace ready"
    );

    let steps = plan_steps(plan);
    let mut tree = TreeState::Untouched;

    for (i, step) in steps.iter().enumerate() {
        println!(
            "\n{} Step {}/{}: {}",
            "▶".cyan(),
            i + 1,
            steps.len(),
            step.kind.to_string().white().bold()
        );
        println!("  {}", step.invocation.to_string().dimmed());
        debug!(step = %step.kind, command = %step.invocation, "running");

        let outcome = runner
            .run(&step.invocation)
            .map_err(|source| BenchError::Launch {
                step: step.kind,
                command: step.invocation.to_string(),
                tree: tree.clone(),
                source,
            })?;

        if !outcome.is_success() {
            warn!(step = %step.kind, status = %outcome, "command failed");
            return Err(BenchError::CommandFailed {
                step: step.kind,
                command: step.invocation.to_string(),
                status: outcome.to_string(),
                tree,
            });
        }

        if let Some(next) = &step.leaves {
            tree = next.clone();
        }
        println!("  {} {}", "✓".green(), step.kind);
    }

    workspace.cleanup()?;
    debug!(copy = %workspace.pdf_copy().display(), "removed PDF copy");

    Ok(RunReport {
        workspace: workspace.clone(),
        baseline_stats: workspace.stats_path(StatsVariant::Baseline),
        current_stats: workspace.stats_path(StatsVariant::Current),
        steps_run: steps.len(),
    })
}
