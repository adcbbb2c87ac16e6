// chan-parity - Core Library
// Reconciles two producers' CSV output sets under per-column normalization,
// and checks single outputs for conflicting duplicate records.

pub mod columns;        // Column categories and specs
pub mod compare;        // Row Comparator
pub mod config;         // Run defaults and schema selection
pub mod consistency;    // Duplicate Consistency Checker
pub mod error;
pub mod normalize;      // Normalizer
pub mod reconciliation; // Table Reconciler
pub mod report;         // Report Emitter
pub mod schema;         // Schema Registry (v1, v2, TOML)
pub mod table;

// Re-export commonly used types
pub use columns::{ColumnCategory, ColumnSpec};
pub use compare::{ColumnDiff, RowComparator};
pub use config::{
    consistency_check, dump_data_root, load_registry, parse_columns, CompareConfig,
    DEFAULT_DIR_A, DEFAULT_DIR_B,
};
pub use consistency::{
    check_file, find_inconsistencies, inconsistent_output_path, ConsistencyCheck,
    ConsistencyGroup, ConsistencyReport,
};
pub use error::{ReconcileError, Result, Side};
pub use normalize::{normalize, normalize_datetime, normalize_enum_tag, Canonical};
pub use reconciliation::{
    reconcile_tables, ArtifactOutcome, ArtifactReport, DiffRecord, RunReport, RunSummary,
    TableReconciler,
};
pub use report::{render_artifact, render_consistency, render_run, render_schema, to_json};
pub use schema::{ArtifactSchema, SchemaRegistry, SchemaVersion};
pub use table::{Cell, Table};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
