// ⚠️ Error types for the reconciliation engine
// Run-level failures; per-artifact problems become outcomes, not errors.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Which of the two output sets a problem belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Side {
    A,
    B,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Input directory or file does not exist
    #[error("path does not exist: {}", .0.display())]
    MissingPath(PathBuf),

    /// Required key or comparison columns absent from a single input table
    #[error("{artifact} is missing column(s): {}", missing.join(", "))]
    SchemaMismatch { artifact: String, missing: Vec<String> },

    /// Table could not be read or parsed
    #[error("failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Schema version not present in the registry
    #[error("unknown schema version: {0}")]
    UnknownVersion(String),

    /// Artifact not registered under the selected version
    #[error("unknown artifact '{artifact}' for schema version {version}")]
    UnknownArtifact { artifact: String, version: String },

    /// Schema file could not be parsed or is invalid
    #[error("schema configuration error: {0}")]
    Config(String),

    /// Writing derived output failed
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReconcileError {
    pub fn load(path: impl AsRef<Path>, source: csv::Error) -> Self {
        ReconcileError::Load {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn schema_mismatch(artifact: impl Into<String>, missing: Vec<String>) -> Self {
        ReconcileError::SchemaMismatch {
            artifact: artifact.into(),
            missing,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;
