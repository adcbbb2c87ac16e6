// 📂 Table Loading - CSV → typed cells
// Column types are inferred per column, the way a dataframe loader does it,
// so numeric columns compare by value and missing-value markers become nulls.

use crate::error::{ReconcileError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Tokens that load as a null cell
pub const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ============================================================================
// CELL
// ============================================================================

/// Raw cell value as loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(true) => write!(f, "True"),
            Cell::Bool(false) => write!(f, "False"),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(x) => write!(f, "{}", x),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

fn is_na(raw: &str) -> bool {
    NA_TOKENS.contains(&raw.trim())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "True" | "TRUE" | "true" => Some(true),
        "False" | "FALSE" | "false" => Some(false),
        _ => None,
    }
}

// ============================================================================
// COLUMN TYPE INFERENCE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

/// Narrowest kind that every non-null value of a column fits
fn infer_kind<'a>(values: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;

    for raw in values.filter(|v| !is_na(v)) {
        let v = raw.trim();
        let this = if v.parse::<i64>().is_ok() {
            ColumnKind::Int
        } else if v.parse::<f64>().is_ok() {
            ColumnKind::Float
        } else if parse_bool(v).is_some() {
            ColumnKind::Bool
        } else {
            return ColumnKind::Text;
        };

        kind = Some(match (kind, this) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Int), ColumnKind::Float) | (Some(ColumnKind::Float), ColumnKind::Int) => {
                ColumnKind::Float
            }
            _ => return ColumnKind::Text,
        });
    }

    kind.unwrap_or(ColumnKind::Text)
}

fn to_cell(raw: &str, kind: ColumnKind) -> Cell {
    if is_na(raw) {
        return Cell::Null;
    }
    let v = raw.trim();
    match kind {
        ColumnKind::Int => v.parse().map(Cell::Int).unwrap_or_else(|_| Cell::Text(raw.to_string())),
        ColumnKind::Float => v.parse().map(Cell::Float).unwrap_or_else(|_| Cell::Text(raw.to_string())),
        ColumnKind::Bool => parse_bool(v).map(Cell::Bool).unwrap_or_else(|| Cell::Text(raw.to_string())),
        ColumnKind::Text => Cell::Text(raw.to_string()),
    }
}

// ============================================================================
// TABLE
// ============================================================================

/// Ordered rows of typed cells under a header
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Cell>>,
}

/// Borrowed view of one row, addressable by column name
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    table: &'a Table,
    cells: &'a [Cell],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        self.table.column_index(column).and_then(|i| self.cells.get(i))
    }

    pub fn cells(&self) -> &'a [Cell] {
        self.cells
    }
}

impl Table {
    /// Load a table from a CSV file
    pub fn from_path(path: &Path) -> Result<Table> {
        if !path.exists() {
            return Err(ReconcileError::MissingPath(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)?;
        let table = Table::from_reader(file).map_err(|e| ReconcileError::load(path, e))?;
        debug!(path = %path.display(), rows = table.len(), columns = table.columns.len(), "loaded table");
        Ok(table)
    }

    /// Load a table from any CSV byte stream (header row required)
    pub fn from_reader<R: Read>(reader: R) -> std::result::Result<Table, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        // Short rows are padded with nulls; long rows are malformed
        let mut raw_rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            if record.len() > columns.len() {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                return Err(csv::Error::from(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!(
                        "line {}: found record with {} fields, but the header has {}",
                        line,
                        record.len(),
                        columns.len()
                    ),
                )));
            }
            raw_rows.push(record);
        }

        let kinds: Vec<ColumnKind> = (0..columns.len())
            .map(|c| infer_kind(raw_rows.iter().map(|r| r.get(c).unwrap_or(""))))
            .collect();

        let rows = raw_rows
            .iter()
            .map(|r| {
                kinds
                    .iter()
                    .enumerate()
                    .map(|(c, kind)| to_cell(r.get(c).unwrap_or(""), *kind))
                    .collect()
            })
            .collect();

        Ok(Table::from_cells(columns, rows))
    }

    /// Build a table from already-typed cells
    pub fn from_cells(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Table {
        let mut index = HashMap::new();
        for (i, name) in columns.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Table { columns, index, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        self.rows.get(row).map(|cells| Record { table: self, cells })
    }

    /// Names from `wanted` that this table lacks, in the given order
    pub fn missing_columns<'a>(&self, wanted: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        wanted
            .into_iter()
            .filter(|name| !self.has_column(name))
            .map(str::to_string)
            .collect()
    }

    /// Copy out the given column positions for every row
    pub fn project(&self, positions: &[usize]) -> Vec<Vec<Cell>> {
        self.rows
            .iter()
            .map(|row| positions.iter().map(|&p| row[p].clone()).collect())
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
