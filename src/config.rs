// ⚙️ Configuration - run defaults, symbol layout, schema selection
// Everything the binary resolves before a run starts. The library never
// reads the environment on its own; these are plain values.

use crate::columns::ColumnSpec;
use crate::consistency::ConsistencyCheck;
use crate::error::{ReconcileError, Result};
use crate::schema::SchemaRegistry;
use std::path::{Path, PathBuf};

/// Directory of the first output set when none is given
pub const DEFAULT_DIR_A: &str = "output";

/// Directory of the second output set when none is given
pub const DEFAULT_DIR_B: &str = "python_result";

/// Per-symbol reference dumps live under `<root>/opt/data/dump_data/<symbol>`
const DUMP_DATA: [&str; 3] = ["opt", "data", "dump_data"];

// ============================================================================
// COMPARE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareConfig {
    pub dir_a: PathBuf,
    pub dir_b: PathBuf,

    /// Schema version name; None selects the registry's latest
    pub version: Option<String>,

    /// TOML registry replacing the built-in one
    pub schema_file: Option<PathBuf>,

    /// Artifacts to compare; empty means all of the version
    pub artifacts: Vec<String>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        CompareConfig {
            dir_a: PathBuf::from(DEFAULT_DIR_A),
            dir_b: PathBuf::from(DEFAULT_DIR_B),
            version: None,
            schema_file: None,
            artifacts: Vec::new(),
        }
    }
}

impl CompareConfig {
    /// `<symbol>_output` against the symbol's reference dump
    pub fn for_symbol(symbol: &str) -> Self {
        Self::for_symbol_under(symbol, &dump_data_root())
    }

    pub fn for_symbol_under(symbol: &str, dump_root: &Path) -> Self {
        CompareConfig {
            dir_a: PathBuf::from(format!("{}_output", symbol)),
            dir_b: dump_root.join(symbol),
            ..Default::default()
        }
    }

    /// Builder: set both directories
    pub fn with_dirs(mut self, dir_a: impl Into<PathBuf>, dir_b: impl Into<PathBuf>) -> Self {
        self.dir_a = dir_a.into();
        self.dir_b = dir_b.into();
        self
    }

    /// Builder: set schema version
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Builder: set schema file
    pub fn with_schema_file(mut self, schema_file: Option<PathBuf>) -> Self {
        self.schema_file = schema_file;
        self
    }

    /// Builder: restrict to named artifacts
    pub fn with_artifacts(mut self, artifacts: Vec<String>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn registry(&self) -> Result<SchemaRegistry> {
        load_registry(self.schema_file.as_deref())
    }
}

/// `<filesystem root>/opt/data/dump_data`; on Windows the root is the current drive
pub fn dump_data_root() -> PathBuf {
    DUMP_DATA.iter().fold(filesystem_root(), |path, part| path.join(part))
}

#[cfg(windows)]
fn filesystem_root() -> PathBuf {
    use std::path::Component;

    let drive = std::env::current_dir().ok().and_then(|cwd| match cwd.components().next() {
        Some(Component::Prefix(prefix)) => Some(prefix.as_os_str().to_string_lossy().into_owned()),
        _ => None,
    });
    PathBuf::from(format!("{}\\", drive.unwrap_or_default()))
}

#[cfg(not(windows))]
fn filesystem_root() -> PathBuf {
    PathBuf::from("/")
}

// ============================================================================
// SCHEMA AND CHECK SELECTION
// ============================================================================

/// Built-in registry, or the TOML file when one is given
pub fn load_registry(schema_file: Option<&Path>) -> Result<SchemaRegistry> {
    match schema_file {
        Some(path) => SchemaRegistry::from_path(path),
        None => Ok(SchemaRegistry::builtin()),
    }
}

/// Comma-separated column names, each with its inferred category
pub fn parse_columns(list: &str) -> Vec<ColumnSpec> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ColumnSpec::inferred)
        .collect()
}

/// Signal-history check with optional overrides for key and columns
pub fn consistency_check(key: Option<&str>, columns: Option<&str>) -> Result<ConsistencyCheck> {
    let mut check = ConsistencyCheck::signal_history();

    if let Some(key) = key {
        let key = key.trim();
        if key.is_empty() {
            return Err(ReconcileError::Config("consistency key must not be empty".to_string()));
        }
        check.key = key.to_string();
    }

    if let Some(list) = columns {
        let parsed = parse_columns(list);
        if parsed.is_empty() {
            return Err(ReconcileError::Config(format!("no comparison columns in '{}'", list)));
        }
        check.columns = parsed;
    }

    Ok(check)
}

// ============================================================================
// TESTS
// ============================================================================
