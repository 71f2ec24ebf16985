//! Per-PDF results directory under the test directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{BenchError, BenchResult};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Which side of the comparison a statistics file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsVariant {
    Baseline,
    Current,
}

impl StatsVariant {
    pub fn file_name(self) -> &'static str {
        match self {
            StatsVariant::Baseline => "baseline.json",
            StatsVariant::Current => "current.json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    /// Workspace path relative to the test directory
    relative: PathBuf,
    pdf_name: String,
}

impl Workspace {
    pub fn new(test_dir: &Path, results_dir: &str, pdf_name: &str) -> Self {
        let relative = Path::new(results_dir).join(pdf_name);
        Self {
            root: test_dir.join(&relative),
            relative,
            pdf_name: pdf_name.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn relative(&self) -> &Path {
        &self.relative
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn stats_path(&self, variant: StatsVariant) -> PathBuf {
        self.root.join(variant.file_name())
    }

    pub fn pdf_copy(&self) -> PathBuf {
        self.root.join(&self.pdf_name)
    }

    /// Create the directory (an existing one is fine) and copy the PDF in.
    pub fn prepare(&self, source_pdf: &Path) -> BenchResult<()> {
        match fs::create_dir_all(&self.root) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && self.root.is_dir() => {}
            Err(e) => return Err(BenchError::io("create results directory", &self.root, e)),
        }

        let target = self.pdf_copy();
        fs::copy(source_pdf, &target).map_err(|e| BenchError::io("copy PDF to", &target, e))?;
        Ok(())
    }

    /// Remove the PDF copy; statistics and the manifest stay.
    pub fn cleanup(&self) -> BenchResult<()> {
        let copy = self.pdf_copy();
        fs::remove_file(&copy).map_err(|e| BenchError::io("remove", &copy, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let pdf = tmp.path().join("input").join("doc.pdf");
        fs::create_dir_all(pdf.parent().unwrap()).unwrap();
        fs::write(&pdf, b"%PDF-1.7\n%%EOF\n").unwrap();
        (tmp, pdf)
    }

    #[test]
    fn paths_are_keyed_by_pdf_name() {
        let ws = Workspace::new(Path::new("/srv/test"), "stats/results", "doc.pdf");
        assert_eq!(ws.root(), Path::new("/srv/test/stats/results/doc.pdf"));
        assert_eq!(ws.relative(), Path::new("stats/results/doc.pdf"));
        assert_eq!(
            ws.manifest_path(),
            Path::new("/srv/test/stats/results/doc.pdf/manifest.json")
        );
        assert_eq!(
            ws.stats_path(StatsVariant::Current),
            Path::new("/srv/test/stats/results/doc.pdf/current.json")
        );
        assert_eq!(
            ws.stats_path(StatsVariant::Baseline),
            Path::new("/srv/test/stats/results/doc.pdf/baseline.json")
        );
        assert_eq!(
            ws.pdf_copy(),
            Path::new("/srv/test/stats/results/doc.pdf/doc.pdf")
        );
    }

    #[test]
    fn prepare_copies_pdf() {
        let (tmp, pdf) = setup();
        let ws = Workspace::new(tmp.path(), "stats/results", "doc.pdf");
        ws.prepare(&pdf).unwrap();

        assert!(ws.root().is_dir());
        assert_eq!(fs::read(ws.pdf_copy()).unwrap(), fs::read(&pdf).unwrap());
    }

    #[test]
    fn prepare_is_idempotent() {
        let (tmp, pdf) = setup();
        let ws = Workspace::new(tmp.path(), "stats/results", "doc.pdf");
        ws.prepare(&pdf).unwrap();
        fs::write(ws.stats_path(StatsVariant::Current), "{}").unwrap();

        ws.prepare(&pdf).unwrap();
        assert!(ws.stats_path(StatsVariant::Current).exists());
    }

    #[test]
    fn prepare_fails_when_root_is_a_file() {
        let (tmp, pdf) = setup();
        let results = tmp.path().join("stats").join("results");
        fs::create_dir_all(&results).unwrap();
        fs::write(results.join("doc.pdf"), "in the way").unwrap();

        let ws = Workspace::new(tmp.path(), "stats/results", "doc.pdf");
        let err = ws.prepare(&pdf).unwrap_err();
        assert!(matches!(err, BenchError::Io { .. }));
    }

    #[test]
    fn cleanup_keeps_statistics() {
        let (tmp, pdf) = setup();
        let ws = Workspace::new(tmp.path(), "stats/results", "doc.pdf");
        ws.prepare(&pdf).unwrap();
        fs::write(ws.manifest_path(), "[]").unwrap();
        fs::write(ws.stats_path(StatsVariant::Baseline), "{}").unwrap();
        fs::write(ws.stats_path(StatsVariant::Current), "{}").unwrap();

        ws.cleanup().unwrap();

        assert!(!ws.pdf_copy().exists());
        assert!(ws.manifest_path().exists());
        assert!(ws.stats_path(StatsVariant::Baseline).exists());
        assert!(ws.stats_path(StatsVariant::Current).exists());
        assert!(pdf.exists(), "source PDF must be left alone");
    }
}
