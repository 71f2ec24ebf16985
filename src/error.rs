//! Error taxonomy for a benchmark run.
//!
//! Every variant is terminal: the orchestrator stops at the first error and
//! never retries or rolls back. The CLI maps each kind to a process exit code.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::bench::{StepKind, TreeState};

/// Exit status for an invocation without a PDF argument.
pub const EXIT_USAGE: u8 = 255;
/// Exit status for rejected options or preconditions.
pub const EXIT_VALIDATION: u8 = 2;
/// Exit status for failed external commands and filesystem errors.
pub const EXIT_FAILURE: u8 = 1;

pub type BenchResult<T> = Result<T, BenchError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    Validation,
    Io,
    Command,
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("no PDF file given")]
    MissingPdf,

    #[error("test file not found '{}'", .0.display())]
    PdfNotFound(PathBuf),

    #[error("test file '{}' has no file name", .0.display())]
    PdfWithoutName(PathBuf),

    #[error("test file name '{}' is not valid UTF-8", .0.display())]
    PdfNameNotUtf8(PathBuf),

    #[error("test file '{}' is the workspace copy; pass the original PDF", .0.display())]
    PdfInWorkspace(PathBuf),

    #[error("{entry_point} not found in directory '{}'", .dir.display())]
    HarnessNotFound { entry_point: String, dir: PathBuf },

    #[error("invalid configuration in '{}'", .dir.display())]
    InvalidConfig {
        dir: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid options for stash mode: --baseline and --current require --mode commits")]
    IdentifiersInStashMode,

    #[error("baseline and current options required for commits mode")]
    MissingCommitIdentifiers,

    #[error("failed to {action} '{}'", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{step}: failed to launch `{command}`")]
    Launch {
        step: StepKind,
        command: String,
        tree: TreeState,
        #[source]
        source: io::Error,
    },

    #[error("{step}: `{command}` exited with {status}")]
    CommandFailed {
        step: StepKind,
        command: String,
        status: String,
        tree: TreeState,
    },
}

impl BenchError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingPdf => ErrorKind::Usage,
            Self::PdfNotFound(_)
            | Self::PdfWithoutName(_)
            | Self::PdfNameNotUtf8(_)
            | Self::PdfInWorkspace(_)
            | Self::InvalidConfig { .. }
            | Self::HarnessNotFound { .. }
            | Self::IdentifiersInStashMode
            | Self::MissingCommitIdentifiers => ErrorKind::Validation,
            Self::Io { .. } => ErrorKind::Io,
            Self::Launch { .. } | Self::CommandFailed { .. } => ErrorKind::Command,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Usage => EXIT_USAGE,
            ErrorKind::Validation => EXIT_VALIDATION,
            ErrorKind::Io | ErrorKind::Command => EXIT_FAILURE,
        }
    }

    /// Manual recovery advice when a failed step left the working tree mutated.
    pub fn recovery_hint(&self) -> Option<String> {
        match self {
            Self::Launch { tree, .. } | Self::CommandFailed { tree, .. } => tree.recovery_hint(),
            _ => None,
        }
    }
}
