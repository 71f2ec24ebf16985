//! A/B benchmark of the PDF test harness across two code states.
//!
//! A [`BenchRequest`] is validated into a [`BenchPlan`] before anything on
//! disk is touched. [`run`] then prepares the results workspace and drives the
//! external commands in a fixed order through a [`CommandRunner`].

mod command;
mod manifest;
mod orchestrator;
mod workspace;

pub use command::{CommandOutcome, CommandRunner, Invocation, SystemRunner};
pub use manifest::{write_manifest, ManifestEntry, TEST_TYPE};
pub use orchestrator::{plan_steps, run, RunReport, Step, StepKind, TreeState};
pub use workspace::{StatsVariant, Workspace, MANIFEST_FILE};

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{BenchError, BenchResult};

/// Which pair of code states to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Working tree against the same tree with local changes stashed
    Stash,
    /// Two committed states, checked out in turn
    Commits { baseline: String, current: String },
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Stash => "stash",
            Mode::Commits { .. } => "commits",
        }
    }
}

/// Mode selector as given on the command line, before identifiers are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Stash,
    Commits,
}

/// Unvalidated invocation options.
#[derive(Debug, Clone)]
pub struct BenchRequest {
    pub pdf: PathBuf,
    pub mode: ModeKind,
    pub baseline: Option<String>,
    pub current: Option<String>,
    pub last_page: u32,
    pub rounds: u32,
    pub test_path: PathBuf,
}

impl BenchRequest {
    pub fn new(pdf: impl Into<PathBuf>) -> Self {
        Self {
            pdf: pdf.into(),
            mode: ModeKind::Stash,
            baseline: None,
            current: None,
            last_page: 1,
            rounds: 20,
            test_path: PathBuf::from("."),
        }
    }

    /// The PDF must be an existing file. Runs before anything else is read.
    pub fn check_pdf(&self) -> BenchResult<()> {
        if !self.pdf.is_file() {
            return Err(BenchError::PdfNotFound(self.pdf.clone()));
        }
        Ok(())
    }
}

/// Everything a run needs, with absolute paths.
#[derive(Debug, Clone)]
pub struct BenchPlan {
    pub mode: Mode,
    pub pdf: PathBuf,
    pub pdf_name: String,
    pub test_dir: PathBuf,
    pub workspace: Workspace,
    pub rounds: u32,
    pub last_page: u32,
    pub config: Config,
}

impl BenchPlan {
    /// Check preconditions in order: PDF, harness entry point, mode identifiers.
    /// Nothing is created on disk.
    pub fn validate(request: BenchRequest, config: Config) -> BenchResult<Self> {
        request.check_pdf()?;
        // Named as given; a symlinked PDF keeps the link's name.
        let pdf_name = file_name(&request.pdf)?;
        let pdf = std::path::absolute(&request.pdf)
            .map_err(|e| BenchError::io("resolve", &request.pdf, e))?;

        let test_dir = absolute(&request.test_path)?;
        if !test_dir.join(&config.harness).exists() {
            return Err(BenchError::HarnessNotFound {
                entry_point: config.harness.clone(),
                dir: test_dir,
            });
        }

        let mode = resolve_mode(request.mode, request.baseline, request.current)?;
        let workspace = Workspace::new(&test_dir, &config.results_dir, &pdf_name);
        if is_same_file(&pdf, &workspace.pdf_copy()) {
            return Err(BenchError::PdfInWorkspace(pdf));
        }

        Ok(Self {
            mode,
            pdf,
            pdf_name,
            test_dir,
            workspace,
            rounds: request.rounds,
            last_page: request.last_page,
            config,
        })
    }

    pub fn manifest_entry(&self) -> ManifestEntry {
        ManifestEntry::for_pdf(&self.pdf_name, &self.config, self.rounds, self.last_page)
    }
}

fn resolve_mode(
    kind: ModeKind,
    baseline: Option<String>,
    current: Option<String>,
) -> BenchResult<Mode> {
    match (kind, baseline, current) {
        (ModeKind::Stash, None, None) => Ok(Mode::Stash),
        (ModeKind::Stash, _, _) => Err(BenchError::IdentifiersInStashMode),
        (ModeKind::Commits, Some(baseline), Some(current)) => {
            Ok(Mode::Commits { baseline, current })
        }
        (ModeKind::Commits, _, _) => Err(BenchError::MissingCommitIdentifiers),
    }
}

fn file_name(pdf: &Path) -> BenchResult<String> {
    let name = pdf
        .file_name()
        .ok_or_else(|| BenchError::PdfWithoutName(pdf.to_path_buf()))?;
    name.to_str()
        .map(str::to_owned)
        .ok_or_else(|| BenchError::PdfNameNotUtf8(pdf.to_path_buf()))
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn absolute(path: &Path) -> BenchResult<PathBuf> {
    if path.exists() {
        return path
            .canonicalize()
            .map_err(|e| BenchError::io("resolve", path, e));
    }
    std::path::absolute(path).map_err(|e| BenchError::io("resolve", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        pdf_dir: TempDir,
        test_dir: TempDir,
        pdf: PathBuf,
    }

    fn fixture() -> Fixture {
        let pdf_dir = TempDir::new().unwrap();
        let test_dir = TempDir::new().unwrap();
        let pdf = pdf_dir.path().join("doc.pdf");
        fs::write(&pdf, b"%PDF-1.4\n").unwrap();
        fs::write(test_dir.path().join("test.py"), "").unwrap();
        Fixture {
            pdf_dir,
            test_dir,
            pdf,
        }
    }

    fn request(fx: &Fixture) -> BenchRequest {
        BenchRequest {
            test_path: fx.test_dir.path().to_path_buf(),
            ..BenchRequest::new(&fx.pdf)
        }
    }

    #[test]
    fn stash_mode_accepts_no_identifiers() {
        let fx = fixture();
        let plan = BenchPlan::validate(request(&fx), Config::default()).unwrap();
        assert_eq!(plan.mode, Mode::Stash);
        assert_eq!(plan.pdf_name, "doc.pdf");
        assert!(plan.pdf.is_absolute());
        assert_eq!(plan.rounds, 20);
        assert_eq!(plan.last_page, 1);
    }

    #[test]
    fn stash_mode_rejects_baseline() {
        let fx = fixture();
        let req = BenchRequest {
            baseline: Some("abc123".to_string()),
            ..request(&fx)
        };
        let err = BenchPlan::validate(req, Config::default()).unwrap_err();
        assert!(matches!(err, BenchError::IdentifiersInStashMode));
    }

    #[test]
    fn stash_mode_rejects_current() {
        let fx = fixture();
        let req = BenchRequest {
            current: Some("HEAD".to_string()),
            ..request(&fx)
        };
        let err = BenchPlan::validate(req, Config::default()).unwrap_err();
        assert!(matches!(err, BenchError::IdentifiersInStashMode));
    }

    #[test]
    fn commits_mode_requires_baseline() {
        let fx = fixture();
        let req = BenchRequest {
            mode: ModeKind::Commits,
            current: Some("HEAD".to_string()),
            ..request(&fx)
        };
        let err = BenchPlan::validate(req, Config::default()).unwrap_err();
        assert!(matches!(err, BenchError::MissingCommitIdentifiers));
    }

    #[test]
    fn commits_mode_requires_current() {
        let fx = fixture();
        let req = BenchRequest {
            mode: ModeKind::Commits,
            baseline: Some("HEAD~1".to_string()),
            ..request(&fx)
        };
        let err = BenchPlan::validate(req, Config::default()).unwrap_err();
        assert!(matches!(err, BenchError::MissingCommitIdentifiers));
    }

    #[test]
    fn commits_mode_keeps_identifiers() {
        let fx = fixture();
        let req = BenchRequest {
            mode: ModeKind::Commits,
            baseline: Some("HEAD~1".to_string()),
            current: Some("HEAD".to_string()),
            ..request(&fx)
        };
        let plan = BenchPlan::validate(req, Config::default()).unwrap();
        assert_eq!(
            plan.mode,
            Mode::Commits {
                baseline: "HEAD~1".to_string(),
                current: "HEAD".to_string(),
            }
        );
    }

    #[test]
    fn missing_pdf_is_rejected_before_anything_is_created() {
        let fx = fixture();
        let req = BenchRequest {
            pdf: fx.test_dir.path().join("nope.pdf"),
            ..request(&fx)
        };
        let err = BenchPlan::validate(req, Config::default()).unwrap_err();
        assert!(matches!(err, BenchError::PdfNotFound(_)));
        assert!(!fx.test_dir.path().join("stats").exists());
    }

    #[test]
    fn directory_as_pdf_is_rejected() {
        let fx = fixture();
        let req = BenchRequest {
            pdf: fx.test_dir.path().to_path_buf(),
            ..request(&fx)
        };
        let err = BenchPlan::validate(req, Config::default()).unwrap_err();
        assert!(matches!(err, BenchError::PdfNotFound(_)));
    }

    #[test]
    fn missing_harness_is_rejected_before_anything_is_created() {
        let fx = fixture();
        fs::remove_file(fx.test_dir.path().join("test.py")).unwrap();
        let err = BenchPlan::validate(request(&fx), Config::default()).unwrap_err();
        assert!(matches!(err, BenchError::HarnessNotFound { .. }));
        assert!(!fx.test_dir.path().join("stats").exists());
    }

    #[test]
    fn pdf_check_precedes_mode_check() {
        let fx = fixture();
        let req = BenchRequest {
            pdf: PathBuf::from("/definitely/not/here.pdf"),
            baseline: Some("abc123".to_string()),
            ..request(&fx)
        };
        let err = BenchPlan::validate(req, Config::default()).unwrap_err();
        assert!(matches!(err, BenchError::PdfNotFound(_)));
    }

    #[test]
    fn workspace_is_keyed_by_basename_under_test_dir() {
        let fx = fixture();
        let plan = BenchPlan::validate(request(&fx), Config::default()).unwrap();
        let test_dir = fx.test_dir.path().canonicalize().unwrap();
        assert_eq!(plan.test_dir, test_dir);
        assert_eq!(
            plan.workspace.root(),
            test_dir.join("stats").join("results").join("doc.pdf")
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_pdf_keeps_the_link_name() {
        let fx = fixture();
        let blob = fx.pdf_dir.path().join("blob-123");
        fs::rename(&fx.pdf, &blob).unwrap();
        std::os::unix::fs::symlink(&blob, &fx.pdf).unwrap();

        let plan = BenchPlan::validate(request(&fx), Config::default()).unwrap();
        let test_dir = fx.test_dir.path().canonicalize().unwrap();
        assert_eq!(plan.pdf_name, "doc.pdf");
        assert_eq!(plan.pdf.file_name().unwrap(), "doc.pdf");
        assert_eq!(
            plan.workspace.root(),
            test_dir.join("stats").join("results").join("doc.pdf")
        );
        assert_eq!(plan.manifest_entry().id, "doc.pdf");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_pdf_name_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let fx = fixture();
        let pdf = fx.pdf_dir.path().join(OsStr::from_bytes(b"bad\xff.pdf"));
        fs::write(&pdf, b"%PDF-1.4\n").unwrap();
        let req = BenchRequest {
            pdf,
            ..request(&fx)
        };
        let err = BenchPlan::validate(req, Config::default()).unwrap_err();
        assert!(matches!(err, BenchError::PdfNameNotUtf8(_)));
        assert_eq!(err.exit_code(), crate::error::EXIT_VALIDATION);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_workspace_copy_is_rejected() {
        let fx = fixture();
        let ws = fx.test_dir.path().join("stats").join("results").join("doc.pdf");
        fs::create_dir_all(&ws).unwrap();
        fs::copy(&fx.pdf, ws.join("doc.pdf")).unwrap();
        fs::remove_file(&fx.pdf).unwrap();
        std::os::unix::fs::symlink(ws.join("doc.pdf"), &fx.pdf).unwrap();

        let err = BenchPlan::validate(request(&fx), Config::default()).unwrap_err();
        assert!(matches!(err, BenchError::PdfInWorkspace(_)));
    }

    #[test]
    fn pdf_already_in_workspace_is_rejected() {
        let fx = fixture();
        let ws = fx.test_dir.path().join("stats").join("results").join("doc.pdf");
        fs::create_dir_all(&ws).unwrap();
        fs::copy(&fx.pdf, ws.join("doc.pdf")).unwrap();
        let req = BenchRequest {
            pdf: ws.join("doc.pdf"),
            ..request(&fx)
        };
        let err = BenchPlan::validate(req, Config::default()).unwrap_err();
        assert!(matches!(err, BenchError::PdfInWorkspace(_)));
    }

    #[test]
    fn custom_harness_name_from_config() {
        let fx = fixture();
        fs::write(fx.test_dir.path().join("run_tests.py"), "").unwrap();
        fs::remove_file(fx.test_dir.path().join("test.py")).unwrap();
        let config = Config {
            harness: "run_tests.py".to_string(),
            ..Config::default()
        };
        assert!(BenchPlan::validate(request(&fx), config).is_ok());
    }
}
