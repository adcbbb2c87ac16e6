// 🔬 Row Comparator - column-by-column equality under normalization

use crate::columns::ColumnSpec;
use crate::normalize::{normalize, Canonical};
use crate::table::Cell;
use serde::Serialize;

/// One disagreeing column, with both sides in canonical form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDiff {
    pub column: String,
    pub a: Canonical,
    pub b: Canonical,
}

/// Compares rows that were projected onto the same ordered columns
#[derive(Debug, Clone, Copy)]
pub struct RowComparator<'a> {
    columns: &'a [ColumnSpec],
}

impl<'a> RowComparator<'a> {
    pub fn new(columns: &'a [ColumnSpec]) -> Self {
        RowComparator { columns }
    }

    /// Every differing column, in schema order. Never stops at the first mismatch.
    pub fn compare(&self, row_a: &[Cell], row_b: &[Cell]) -> Vec<ColumnDiff> {
        debug_assert_eq!(row_a.len(), self.columns.len());
        debug_assert_eq!(row_b.len(), self.columns.len());

        self.columns
            .iter()
            .zip(row_a.iter().zip(row_b))
            .filter_map(|(spec, (a, b))| {
                let a = normalize(spec.category, a);
                let b = normalize(spec.category, b);
                // Absent == Absent holds through plain equality
                (a != b).then(|| ColumnDiff {
                    column: spec.name.clone(),
                    a,
                    b,
                })
            })
            .collect()
    }

    pub fn differing_columns(&self, row_a: &[Cell], row_b: &[Cell]) -> Vec<String> {
        self.compare(row_a, row_b).into_iter().map(|d| d.column).collect()
    }

    /// Canonical tuple of a row, for grouping and set comparison
    pub fn normalize_row(&self, row: &[Cell]) -> Vec<Canonical> {
        self.columns
            .iter()
            .zip(row)
            .map(|(spec, cell)| normalize(spec.category, cell))
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
