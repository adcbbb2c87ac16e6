// 🔍 Duplicate Consistency Checker - one logical event, conflicting records
// Rows sharing a key (e.g. the same begin_time) must agree on every
// comparison column. A group with any disagreement is flagged as a whole.

use crate::columns::{ColumnCategory, ColumnSpec};
use crate::compare::RowComparator;
use crate::error::{ReconcileError, Result};
use crate::normalize::{normalize, Canonical};
use crate::table::Table;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Suffix of the derived file holding the inconsistent rows
pub const INCONSISTENT_SUFFIX: &str = "_inconsistent.csv";

// ============================================================================
// CHECK DEFINITION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyCheck {
    /// Logical event key; canonicalized as a timestamp
    pub key: String,

    /// Columns every member of a group must agree on
    pub columns: Vec<ColumnSpec>,
}

impl ConsistencyCheck {
    pub fn new(key: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        ConsistencyCheck {
            key: key.into(),
            columns,
        }
    }

    /// Signal-point history: one signal per begin_time
    pub fn signal_history() -> Self {
        ConsistencyCheck::new(
            "begin_time",
            vec![
                ColumnSpec::new("bsp_type", ColumnCategory::EnumTag),
                ColumnSpec::new("is_buy", ColumnCategory::BooleanLike),
                ColumnSpec::new("relate_bsp1", ColumnCategory::NullableIndex),
                ColumnSpec::new("bi_idx", ColumnCategory::Plain),
                ColumnSpec::new("bi_begin_time", ColumnCategory::DateTime),
                ColumnSpec::new("bi_end_time", ColumnCategory::DateTime),
            ],
        )
    }

    /// Columns written in canonical timestamp form to the derived file
    fn is_temporal(&self, column: &str) -> bool {
        column == self.key
            || self
                .columns
                .iter()
                .any(|c| c.name == column && c.category == ColumnCategory::DateTime)
    }
}

// ============================================================================
// GROUPS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyGroup {
    pub key: Canonical,

    /// 0-based row indices into the checked table, in file order
    pub rows: Vec<usize>,

    /// Number of distinct normalized comparison tuples in the group
    pub distinct: usize,
}

/// Groups of rows that share a key but disagree, sorted by key
pub fn find_inconsistencies(table: &Table, check: &ConsistencyCheck) -> Result<Vec<ConsistencyGroup>> {
    let wanted = std::iter::once(check.key.as_str()).chain(check.columns.iter().map(|c| c.name.as_str()));
    let missing = table.missing_columns(wanted);
    if !missing.is_empty() {
        return Err(ReconcileError::schema_mismatch("table", missing));
    }

    let key_position = table.column_index(&check.key).into_iter().collect::<Vec<_>>();
    let positions: Vec<usize> = check
        .columns
        .iter()
        .filter_map(|c| table.column_index(&c.name))
        .collect();

    let keys = table.project(&key_position);
    let mut groups: BTreeMap<Canonical, Vec<usize>> = BTreeMap::new();
    for (row, key) in keys.iter().enumerate() {
        let key = normalize(ColumnCategory::DateTime, &key[0]);
        if key.is_absent() {
            debug!(row = row + 1, "skipping row without key");
            continue;
        }
        groups.entry(key).or_default().push(row);
    }

    let tuples = table.project(&positions);
    let comparator = RowComparator::new(&check.columns);

    let inconsistent: Vec<ConsistencyGroup> = groups
        .into_iter()
        .filter(|(_, rows)| rows.len() > 1)
        .filter_map(|(key, rows)| {
            let distinct: HashSet<Vec<Canonical>> =
                rows.iter().map(|&r| comparator.normalize_row(&tuples[r])).collect();
            (distinct.len() > 1).then(|| ConsistencyGroup {
                key,
                rows,
                distinct: distinct.len(),
            })
        })
        .collect();

    debug!(groups = inconsistent.len(), "consistency check complete");
    Ok(inconsistent)
}

// ============================================================================
// DERIVED OUTPUT
// ============================================================================

/// `signals.csv` → `signals_inconsistent.csv`, next to the input
pub fn inconsistent_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".csv").unwrap_or(&name);
    input.with_file_name(format!("{}{}", stem, INCONSISTENT_SUFFIX))
}

fn csv_value(value: Canonical) -> String {
    match value {
        Canonical::Absent => String::new(),
        other => other.to_string(),
    }
}

/// Every column of the inconsistent rows, sorted by key, as written to the derived file.
///
/// The key and temporal comparison columns are rendered in canonical form.
pub fn inconsistent_records(table: &Table, check: &ConsistencyCheck, groups: &[ConsistencyGroup]) -> Vec<Vec<String>> {
    let temporal: Vec<bool> = table.columns().iter().map(|c| check.is_temporal(c)).collect();

    groups
        .iter()
        .flat_map(|g| g.rows.iter().copied())
        .filter_map(|row| table.record(row))
        .map(|record| {
            record
                .cells()
                .iter()
                .zip(&temporal)
                .map(|(cell, &is_temporal)| {
                    if is_temporal {
                        csv_value(normalize(ColumnCategory::DateTime, cell))
                    } else {
                        cell.to_string()
                    }
                })
                .collect()
        })
        .collect()
}

pub fn write_inconsistent(columns: &[String], records: &[Vec<String>], output: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(columns)?;
    for record in records {
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

// ============================================================================
// FILE-LEVEL CHECK
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ConsistencyReport {
    pub input: PathBuf,
    pub check: ConsistencyCheck,
    pub groups: Vec<ConsistencyGroup>,

    /// Rows across all inconsistent groups
    pub inconsistent_rows: usize,

    /// Derived file, written only when something was found
    pub output: Option<PathBuf>,

    /// Column names of the checked file
    pub columns: Vec<String>,

    /// Inconsistent rows exactly as written to the derived file
    pub rows: Vec<Vec<String>>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Load a file, check it, and write the derived file when needed
pub fn check_file(path: &Path, check: &ConsistencyCheck) -> Result<ConsistencyReport> {
    let table = Table::from_path(path)?;
    let artifact = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let groups = find_inconsistencies(&table, check).map_err(|e| match e {
        ReconcileError::SchemaMismatch { missing, .. } => ReconcileError::schema_mismatch(artifact.clone(), missing),
        other => other,
    })?;

    let inconsistent_rows = groups.iter().map(|g| g.rows.len()).sum();
    let mut output = None;
    let mut rows = Vec::new();

    if !groups.is_empty() {
        let out_path = inconsistent_output_path(path);
        rows = inconsistent_records(&table, check, &groups);
        write_inconsistent(table.columns(), &rows, &out_path)?;
        info!(rows = inconsistent_rows, output = %out_path.display(), "wrote inconsistent rows");
        output = Some(out_path);
    }

    Ok(ConsistencyReport {
        input: path.to_path_buf(),
        check: check.clone(),
        groups,
        inconsistent_rows,
        output,
        columns: table.columns().to_vec(),
        rows,
    })
}

// ============================================================================
// TESTS
// ============================================================================
