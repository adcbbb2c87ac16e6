// ⚖️ Reconciliation Engine - do two output sets say the same thing?
//
// For every artifact of the selected schema version:
//   project both tables onto the comparison columns
//   → row counts must match
//   → rows are compared pairwise by position
//
// Each artifact is reconciled in isolation: a missing or malformed file
// becomes that artifact's outcome and never stops the rest of the run.

use crate::compare::{ColumnDiff, RowComparator};
use crate::columns::ColumnSpec;
use crate::error::{ReconcileError, Result, Side};
use crate::schema::{ArtifactSchema, SchemaRegistry, SchemaVersion};
use crate::table::Table;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// ============================================================================
// DIFF RECORD
// ============================================================================

/// Disagreement between the two sources for one row of one artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffRecord {
    pub artifact: String,

    /// 1-based row position (header excluded)
    pub row: usize,

    pub columns: Vec<ColumnDiff>,
}

// ============================================================================
// ARTIFACT OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactOutcome {
    /// Same row count, no differing cells
    Identical { rows: usize },

    /// Positional alignment is meaningless, so no rows were compared
    RowCountMismatch { a: usize, b: usize },

    /// Same row count, some rows disagree
    Differences { rows: usize, diffs: Vec<DiffRecord> },

    /// Artifact file absent from one source
    MissingArtifact { side: Side, path: PathBuf },

    /// Required comparison columns absent from one or both tables
    SchemaMismatch {
        missing_a: Vec<String>,
        missing_b: Vec<String>,
    },

    /// File present but unreadable or malformed
    LoadFailed { side: Side, message: String },
}

impl ArtifactOutcome {
    pub fn is_identical(&self) -> bool {
        matches!(self, ArtifactOutcome::Identical { .. })
    }

    /// Missing, mismatched or unreadable, as opposed to a completed comparison
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            ArtifactOutcome::MissingArtifact { .. }
                | ArtifactOutcome::SchemaMismatch { .. }
                | ArtifactOutcome::LoadFailed { .. }
        )
    }

    pub fn diffs(&self) -> &[DiffRecord] {
        match self {
            ArtifactOutcome::Differences { diffs, .. } => diffs,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactReport {
    pub artifact: String,
    pub outcome: ArtifactOutcome,
}

impl ArtifactReport {
    pub fn is_identical(&self) -> bool {
        self.outcome.is_identical()
    }
}

// ============================================================================
// RUN REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub identical: usize,
    pub differing: usize,
    pub row_count_mismatches: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub version: String,
    pub dir_a: PathBuf,
    pub dir_b: PathBuf,
    pub artifacts: Vec<ArtifactReport>,
    pub reconciled_at: DateTime<Utc>,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for report in &self.artifacts {
            match &report.outcome {
                ArtifactOutcome::Identical { .. } => summary.identical += 1,
                ArtifactOutcome::Differences { .. } => summary.differing += 1,
                ArtifactOutcome::RowCountMismatch { .. } => summary.row_count_mismatches += 1,
                _ => summary.skipped += 1,
            }
        }
        summary
    }

    /// Every artifact compared and identical
    pub fn is_clean(&self) -> bool {
        self.artifacts.iter().all(ArtifactReport::is_identical)
    }

    pub fn artifact(&self, name: &str) -> Option<&ArtifactReport> {
        self.artifacts.iter().find(|a| a.artifact == name)
    }
}

// ============================================================================
// TABLE RECONCILER
// ============================================================================

/// Reconciles output sets under one schema version
#[derive(Debug, Clone, Copy)]
pub struct TableReconciler<'a> {
    version: &'a SchemaVersion,
}

impl<'a> TableReconciler<'a> {
    /// Reconciler for a named version, or the registry's latest
    pub fn new(registry: &'a SchemaRegistry, version: Option<&str>) -> Result<Self> {
        Ok(TableReconciler {
            version: registry.resolve(version)?,
        })
    }

    pub fn version(&self) -> &'a SchemaVersion {
        self.version
    }

    /// Reconcile two loaded tables of a registered artifact
    pub fn reconcile(&self, artifact: &str, table_a: &Table, table_b: &Table) -> Result<ArtifactReport> {
        let schema = self.schema(artifact)?;
        Ok(ArtifactReport {
            artifact: schema.artifact.clone(),
            outcome: reconcile_tables(schema, table_a, table_b),
        })
    }

    /// Reconcile every selected artifact found under two directories.
    ///
    /// An empty selection means every artifact of the version. Results come
    /// back in registry order whatever the evaluation order was.
    pub fn reconcile_dirs(&self, dir_a: &Path, dir_b: &Path, selection: &[String]) -> Result<RunReport> {
        for dir in [dir_a, dir_b] {
            if !dir.is_dir() {
                return Err(ReconcileError::MissingPath(dir.to_path_buf()));
            }
        }

        let schemas = self.select(selection)?;
        info!(
            version = %self.version.name,
            artifacts = schemas.len(),
            "reconciling {} against {}",
            dir_a.display(),
            dir_b.display()
        );

        let artifacts = map_in_order(&schemas, |schema| ArtifactReport {
            artifact: schema.artifact.clone(),
            outcome: reconcile_files(schema, dir_a, dir_b),
        });

        Ok(RunReport {
            version: self.version.name.clone(),
            dir_a: dir_a.to_path_buf(),
            dir_b: dir_b.to_path_buf(),
            artifacts,
            reconciled_at: Utc::now(),
        })
    }

    fn schema(&self, artifact: &str) -> Result<&'a ArtifactSchema> {
        self.version
            .artifact(artifact)
            .ok_or_else(|| ReconcileError::UnknownArtifact {
                artifact: artifact.to_string(),
                version: self.version.name.clone(),
            })
    }

    fn select(&self, selection: &[String]) -> Result<Vec<&'a ArtifactSchema>> {
        for name in selection {
            self.schema(name)?;
        }
        Ok(self
            .version
            .artifacts
            .iter()
            .filter(|s| selection.is_empty() || selection.iter().any(|n| *n == s.artifact))
            .collect())
    }
}

#[cfg(feature = "parallel")]
fn map_in_order<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    use rayon::prelude::*;
    items.par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_in_order<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    F: Fn(&T) -> R,
{
    items.iter().map(f).collect()
}

fn reconcile_files(schema: &ArtifactSchema, dir_a: &Path, dir_b: &Path) -> ArtifactOutcome {
    let path_a = dir_a.join(&schema.artifact);
    let path_b = dir_b.join(&schema.artifact);

    for (side, path) in [(Side::A, &path_a), (Side::B, &path_b)] {
        if !path.is_file() {
            warn!(artifact = %schema.artifact, %side, "artifact file missing: {}", path.display());
            return ArtifactOutcome::MissingArtifact {
                side,
                path: path.clone(),
            };
        }
    }

    let table_a = match Table::from_path(&path_a) {
        Ok(t) => t,
        Err(e) => return load_failed(schema, Side::A, e),
    };
    let table_b = match Table::from_path(&path_b) {
        Ok(t) => t,
        Err(e) => return load_failed(schema, Side::B, e),
    };

    reconcile_tables(schema, &table_a, &table_b)
}

fn load_failed(schema: &ArtifactSchema, side: Side, err: ReconcileError) -> ArtifactOutcome {
    warn!(artifact = %schema.artifact, %side, "load failed: {}", err);
    ArtifactOutcome::LoadFailed {
        side,
        message: err.to_string(),
    }
}

/// Columns both tables carry, with their positions in each table
struct Projection {
    columns: Vec<ColumnSpec>,
    positions_a: Vec<usize>,
    positions_b: Vec<usize>,
}

fn project(schema: &ArtifactSchema, table_a: &Table, table_b: &Table) -> std::result::Result<Projection, ArtifactOutcome> {
    let mut projection = Projection {
        columns: Vec::with_capacity(schema.columns.len()),
        positions_a: Vec::with_capacity(schema.columns.len()),
        positions_b: Vec::with_capacity(schema.columns.len()),
    };
    let mut missing_a = Vec::new();
    let mut missing_b = Vec::new();

    for spec in &schema.columns {
        match (table_a.column_index(&spec.name), table_b.column_index(&spec.name)) {
            (Some(a), Some(b)) => {
                projection.columns.push(spec.clone());
                projection.positions_a.push(a);
                projection.positions_b.push(b);
            }
            (None, None) if spec.optional => {
                debug!(artifact = %schema.artifact, column = %spec.name, "optional column absent on both sides");
            }
            (a, b) => {
                if a.is_none() {
                    missing_a.push(spec.name.clone());
                }
                if b.is_none() {
                    missing_b.push(spec.name.clone());
                }
            }
        }
    }

    if missing_a.is_empty() && missing_b.is_empty() {
        Ok(projection)
    } else {
        Err(ArtifactOutcome::SchemaMismatch { missing_a, missing_b })
    }
}

/// Reconcile two loaded tables against one artifact schema
pub fn reconcile_tables(schema: &ArtifactSchema, table_a: &Table, table_b: &Table) -> ArtifactOutcome {
    let projection = match project(schema, table_a, table_b) {
        Ok(p) => p,
        Err(outcome) => {
            warn!(artifact = %schema.artifact, "schema mismatch");
            return outcome;
        }
    };

    if table_a.len() != table_b.len() {
        info!(artifact = %schema.artifact, a = table_a.len(), b = table_b.len(), "row count mismatch");
        return ArtifactOutcome::RowCountMismatch {
            a: table_a.len(),
            b: table_b.len(),
        };
    }

    let rows_a = table_a.project(&projection.positions_a);
    let rows_b = table_b.project(&projection.positions_b);
    let comparator = RowComparator::new(&projection.columns);

    let diffs: Vec<DiffRecord> = rows_a
        .iter()
        .zip(&rows_b)
        .enumerate()
        .filter_map(|(i, (a, b))| {
            let columns = comparator.compare(a, b);
            (!columns.is_empty()).then(|| DiffRecord {
                artifact: schema.artifact.clone(),
                row: i + 1,
                columns,
            })
        })
        .collect();

    let rows = table_a.len();
    if diffs.is_empty() {
        info!(artifact = %schema.artifact, rows, "identical");
        ArtifactOutcome::Identical { rows }
    } else {
        info!(artifact = %schema.artifact, rows, differing = diffs.len(), "differences found");
        ArtifactOutcome::Differences { rows, diffs }
    }
}

// ============================================================================
// TESTS
// ============================================================================
