// 📐 Schema Registry - which columns matter per artifact, per format version
// Producers changed their output contract over time, so every artifact
// schema is registered under an explicit version and nothing is guessed.

use crate::columns::{ColumnCategory, ColumnSpec};
use crate::error::{ReconcileError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ============================================================================
// SCHEMA TYPES
// ============================================================================

/// Ordered comparison columns for one artifact file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSchema {
    pub artifact: String,
    pub columns: Vec<ColumnSpec>,
}

impl ArtifactSchema {
    pub fn new(artifact: impl Into<String>, columns: Vec<ColumnSpec>) -> Self {
        ArtifactSchema {
            artifact: artifact.into(),
            columns,
        }
    }
}

/// One generation of producer output contracts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaVersion {
    pub name: String,
    pub artifacts: Vec<ArtifactSchema>,
}

impl SchemaVersion {
    pub fn artifact(&self, name: &str) -> Option<&ArtifactSchema> {
        self.artifacts.iter().find(|a| a.artifact == name)
    }
}

// ============================================================================
// SCHEMA REGISTRY
// ============================================================================

/// Immutable catalog of artifact schemas keyed by (version, artifact).
///
/// Built once at startup and passed by reference into the reconciler and
/// the consistency checker. Versions and artifacts keep registration
/// order, which is also the reporting order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaRegistry {
    versions: Vec<SchemaVersion>,
}

impl SchemaRegistry {
    /// Registry holding the built-in `v1` (legacy) and `v2` (current) contracts
    pub fn builtin() -> Self {
        let mut registry = SchemaRegistry::default();
        registry.add_version(builtin::version("v1", builtin::V1));
        registry.add_version(builtin::version("v2", builtin::V2));
        registry
    }

    /// Load a registry from a TOML schema file
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReconcileError::MissingPath(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a registry from TOML.
    ///
    /// ```toml
    /// [[version]]
    /// name = "v3"
    ///
    /// [[version.artifact]]
    /// name = "bi_list.csv"
    /// columns = ["begin_time", { name = "parent_seg_idx", category = "nullable_index", optional = true }]
    /// ```
    ///
    /// Columns given as bare names get [`ColumnCategory::infer`].
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: file::RegistryFile =
            toml::from_str(content).map_err(|e| ReconcileError::Config(e.to_string()))?;

        let mut registry = SchemaRegistry::default();
        for version in file.versions {
            let artifacts = version
                .artifacts
                .into_iter()
                .map(|a| ArtifactSchema::new(a.name, a.columns.into_iter().map(Into::into).collect()))
                .collect();
            registry.add_version(SchemaVersion {
                name: version.name,
                artifacts,
            });
        }

        registry.validate()?;
        Ok(registry)
    }

    fn add_version(&mut self, version: SchemaVersion) {
        self.versions.push(version);
    }

    /// Reject registries that would make comparisons ambiguous
    pub fn validate(&self) -> Result<()> {
        if self.versions.is_empty() {
            return Err(ReconcileError::Config("no schema versions defined".to_string()));
        }

        let mut seen_versions = HashSet::new();
        for version in &self.versions {
            if !seen_versions.insert(version.name.as_str()) {
                return Err(ReconcileError::Config(format!("duplicate version '{}'", version.name)));
            }

            let mut seen_artifacts = HashSet::new();
            for schema in &version.artifacts {
                if !seen_artifacts.insert(schema.artifact.as_str()) {
                    return Err(ReconcileError::Config(format!(
                        "version '{}': duplicate artifact '{}'",
                        version.name, schema.artifact
                    )));
                }
                if schema.columns.is_empty() {
                    return Err(ReconcileError::Config(format!(
                        "version '{}': artifact '{}' has no columns",
                        version.name, schema.artifact
                    )));
                }

                let mut seen_columns = HashSet::new();
                for column in &schema.columns {
                    if !seen_columns.insert(column.name.as_str()) {
                        return Err(ReconcileError::Config(format!(
                            "version '{}': artifact '{}' lists column '{}' twice",
                            version.name, schema.artifact, column.name
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    pub fn version_names(&self) -> impl Iterator<Item = &str> {
        self.versions.iter().map(|v| v.name.as_str())
    }

    /// Most recently registered version
    pub fn latest(&self) -> Option<&SchemaVersion> {
        self.versions.last()
    }

    pub fn version(&self, name: &str) -> Result<&SchemaVersion> {
        self.versions
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| ReconcileError::UnknownVersion(name.to_string()))
    }

    /// Selected version, or the latest when none is named
    pub fn resolve(&self, name: Option<&str>) -> Result<&SchemaVersion> {
        match name {
            Some(name) => self.version(name),
            None => self
                .latest()
                .ok_or_else(|| ReconcileError::Config("no schema versions defined".to_string())),
        }
    }

    /// Comparison columns of an artifact under a version (None if unknown)
    pub fn columns_for(&self, artifact: &str, version: &str) -> Option<&[ColumnSpec]> {
        self.versions
            .iter()
            .find(|v| v.name == version)
            .and_then(|v| v.artifact(artifact))
            .map(|a| a.columns.as_slice())
    }
}

// ============================================================================
// SCHEMA FILE FORMAT
// ============================================================================

mod file {
    use super::*;

    #[derive(Debug, Deserialize)]
    pub struct RegistryFile {
        #[serde(rename = "version", default)]
        pub versions: Vec<VersionFile>,
    }

    #[derive(Debug, Deserialize)]
    pub struct VersionFile {
        pub name: String,
        #[serde(rename = "artifact", default)]
        pub artifacts: Vec<ArtifactFile>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ArtifactFile {
        pub name: String,
        pub columns: Vec<ColumnEntry>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub enum ColumnEntry {
        Name(String),
        Spec {
            name: String,
            #[serde(default)]
            category: Option<ColumnCategory>,
            #[serde(default)]
            optional: bool,
        },
    }

    impl From<ColumnEntry> for ColumnSpec {
        fn from(entry: ColumnEntry) -> Self {
            match entry {
                ColumnEntry::Name(name) => ColumnSpec::inferred(name),
                ColumnEntry::Spec { name, category, optional } => {
                    let spec = match category {
                        Some(category) => ColumnSpec::new(name, category),
                        None => ColumnSpec::inferred(name),
                    };
                    if optional {
                        spec.optional()
                    } else {
                        spec
                    }
                }
            }
        }
    }
}

// ============================================================================
// BUILT-IN CONTRACTS
// ============================================================================

mod builtin {
    use super::{ArtifactSchema, SchemaVersion};
    use crate::columns::ColumnCategory::{self, *};
    use crate::columns::ColumnSpec;

    type Table = &'static [(&'static str, &'static [(&'static str, ColumnCategory)])];

    pub fn version(name: &str, table: Table) -> SchemaVersion {
        SchemaVersion {
            name: name.to_string(),
            artifacts: table
                .iter()
                .map(|(artifact, columns)| {
                    ArtifactSchema::new(
                        *artifact,
                        columns.iter().map(|(c, cat)| ColumnSpec::new(*c, *cat)).collect(),
                    )
                })
                .collect(),
        }
    }

    /// First producer contract: begin time, direction, extremes and sure flags
    pub const V1: Table = &[
        ("kline_list.csv", &[("begin_time", DateTime), ("end_time", DateTime)]),
        (
            "bi_list.csv",
            &[("begin_time", DateTime), ("dir", Plain), ("high", Plain), ("low", Plain), ("is_sure", BooleanLike)],
        ),
        (
            "bs_point_history.csv",
            &[("begin_time", DateTime), ("bsp_type", EnumTag), ("is_sure", BooleanLike), ("relate_bsp1", NullableIndex)],
        ),
        (
            "bs_point_lst.csv",
            &[("begin_time", DateTime), ("dir", Plain), ("high", Plain), ("low", Plain), ("fx", Text)],
        ),
        (
            "seg_bs_point_lst.csv",
            &[("begin_time", DateTime), ("dir", Plain), ("high", Plain), ("low", Plain), ("fx", Text)],
        ),
        (
            "seg_list.csv",
            &[
                ("begin_time", DateTime),
                ("dir", Plain),
                ("high", Plain),
                ("low", Plain),
                ("is_sure", BooleanLike),
                ("zs_count", Plain),
            ],
        ),
        (
            "seg_seg_list.csv",
            &[
                ("begin_time", DateTime),
                ("dir", Plain),
                ("high", Plain),
                ("low", Plain),
                ("is_sure", BooleanLike),
                ("zs_count", Plain),
            ],
        ),
        (
            "seg_zs_list.csv",
            &[
                ("begin_time", DateTime),
                ("high", Plain),
                ("low", Plain),
                ("peak_high", Plain),
                ("peak_low", Plain),
                ("is_sure", BooleanLike),
            ],
        ),
        (
            "zs_list.csv",
            &[
                ("begin_time", DateTime),
                ("high", Plain),
                ("low", Plain),
                ("peak_high", Plain),
                ("peak_low", Plain),
                ("is_sure", BooleanLike),
            ],
        ),
    ];

    /// Current contract: parent segment links, sub-zone counts, clock columns, history artifacts
    pub const V2: Table = &[
        (
            "kline_list.csv",
            &[
                ("begin_time", DateTime),
                ("end_time", DateTime),
                ("idx", Plain),
                ("dir", Plain),
                ("high", Plain),
                ("low", Plain),
                ("fx", Text),
            ],
        ),
        (
            "bi_list.csv",
            &[
                ("begin_time", DateTime),
                ("end_time", DateTime),
                ("idx", Plain),
                ("dir", Plain),
                ("high", Plain),
                ("low", Plain),
                ("is_sure", BooleanLike),
                ("seg_idx", Plain),
                ("begin_klc", Plain),
                ("end_klc", Plain),
                ("begin_val", Plain),
                ("end_val", Plain),
                ("klu_cnt", Plain),
                ("klc_cnt", Plain),
                ("parent_seg_idx", NullableIndex),
                ("parent_seg_dir", NullableIndex),
            ],
        ),
        (
            "seg_list.csv",
            &[
                ("begin_time", DateTime),
                ("end_time", DateTime),
                ("idx", Plain),
                ("dir", Plain),
                ("high", Plain),
                ("low", Plain),
                ("is_sure", BooleanLike),
                ("start_bi_idx", Plain),
                ("end_bi_idx", Plain),
                ("zs_count", Plain),
                ("bi_count", Plain),
                ("reason", Text),
                ("parent_seg_idx", NullableIndex),
                ("parent_seg_dir", NullableIndex),
            ],
        ),
        (
            "zs_list.csv",
            &[
                ("begin_time", DateTime),
                ("end_time", DateTime),
                ("high", Plain),
                ("low", Plain),
                ("peak_high", Plain),
                ("peak_low", Plain),
                ("is_sure", BooleanLike),
                ("begin_bi_idx", Plain),
                ("end_bi_idx", Plain),
                ("bi_in", Plain),
                ("bi_out", Plain),
                ("sub_zs_count", Plain),
            ],
        ),
        (
            "bs_point_lst.csv",
            &[
                ("begin_time", DateTime),
                ("bsp_type", EnumTag),
                ("bi_idx", Plain),
                ("bi_begin_time", DateTime),
                ("bi_end_time", DateTime),
                ("relate_bsp1_time", NullableIndex),
            ],
        ),
        (
            "bs_point_history.csv",
            &[
                ("begin_time", DateTime),
                ("bsp_type", EnumTag),
                ("is_buy", BooleanLike),
                ("bi_idx", Plain),
                ("bi_begin_time", DateTime),
                ("bi_end_time", DateTime),
                ("relate_bsp1", NullableIndex),
            ],
        ),
        (
            "seg_seg_list.csv",
            &[
                ("begin_time", DateTime),
                ("end_time", DateTime),
                ("idx", Plain),
                ("dir", Plain),
                ("high", Plain),
                ("low", Plain),
                ("is_sure", BooleanLike),
                ("start_seg_idx", Plain),
                ("end_seg_idx", Plain),
                ("zs_count", Plain),
                ("bi_count", Plain),
                ("reason", Text),
            ],
        ),
        (
            "seg_zs_list.csv",
            &[
                ("begin_time", DateTime),
                ("end_time", DateTime),
                ("high", Plain),
                ("low", Plain),
                ("peak_high", Plain),
                ("peak_low", Plain),
                ("is_sure", BooleanLike),
                ("begin_seg_idx", Plain),
                ("end_seg_idx", Plain),
                ("bi_in", Plain),
                ("bi_out", Plain),
            ],
        ),
        (
            "seg_bs_point_lst.csv",
            &[
                ("begin_time", DateTime),
                ("bsp_type", EnumTag),
                ("seg_idx", Plain),
                ("bi_begin_time", DateTime),
                ("bi_end_time", DateTime),
            ],
        ),
        (
            "segseg_history.csv",
            &[
                ("clock", DateTime),
                ("end_bi_begin_klu_time", DateTime),
                ("begin_time", DateTime),
                ("end_time", DateTime),
                ("idx", Plain),
                ("dir", Plain),
                ("high", Plain),
                ("low", Plain),
                ("is_sure", BooleanLike),
                ("start_seg_idx", Plain),
                ("end_seg_idx", Plain),
                ("zs_count", Plain),
                ("bi_count", Plain),
                ("reason", Text),
            ],
        ),
        (
            "seg_bs_point_history.csv",
            &[
                ("begin_time", DateTime),
                ("bsp_type", EnumTag),
                ("is_buy", BooleanLike),
                ("relate_bsp1", NullableIndex),
                ("seg_idx", Plain),
                ("bi_begin_time", DateTime),
                ("bi_end_time", DateTime),
            ],
        ),
    ];
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_versions() {
        let registry = SchemaRegistry::builtin();

        assert_eq!(registry.version_names().collect::<Vec<_>>(), vec!["v1", "v2"]);
        assert_eq!(registry.latest().unwrap().name, "v2");
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_bi_list_drifts_between_versions() {
        let registry = SchemaRegistry::builtin();

        let v1 = registry.columns_for("bi_list.csv", "v1").unwrap();
        let v2 = registry.columns_for("bi_list.csv", "v2").unwrap();

        assert_eq!(v1.len(), 5);
        assert_eq!(v2.len(), 16);
        assert!(v1.iter().all(|c| c.name != "parent_seg_idx"));
        assert!(v2.iter().any(|c| c.name == "parent_seg_idx" && c.category == ColumnCategory::NullableIndex));
    }

    #[test]
    fn test_history_artifacts_only_in_current_version() {
        let registry = SchemaRegistry::builtin();

        assert!(registry.columns_for("segseg_history.csv", "v1").is_none());
        let clock = &registry.columns_for("segseg_history.csv", "v2").unwrap()[0];
        assert_eq!(clock.name, "clock");
        assert_eq!(clock.category, ColumnCategory::DateTime);
    }

    #[test]
    fn test_unknown_lookups() {
        let registry = SchemaRegistry::builtin();

        assert!(registry.columns_for("nope.csv", "v2").is_none());
        assert!(matches!(registry.version("v9"), Err(ReconcileError::UnknownVersion(_))));
        assert_eq!(registry.resolve(None).unwrap().name, "v2");
    }

    #[test]
    fn test_current_artifact_order_is_fixed() {
        let registry = SchemaRegistry::builtin();
        let names: Vec<&str> = registry
            .version("v2")
            .unwrap()
            .artifacts
            .iter()
            .map(|a| a.artifact.as_str())
            .collect();

        assert_eq!(names.first(), Some(&"kline_list.csv"));
        assert_eq!(names.last(), Some(&"seg_bs_point_history.csv"));
        assert_eq!(names.len(), 11);
    }

    #[test]
    fn test_from_toml_with_inferred_and_explicit_categories() {
        let registry = SchemaRegistry::from_toml(
            r#"
[[version]]
name = "v3"

[[version.artifact]]
name = "bi_list.csv"
columns = [
    "begin_time",
    "is_sure",
    { name = "parent_seg_idx", optional = true },
    { name = "dir", category = "text" },
]
"#,
        )
        .unwrap();

        let columns = registry.columns_for("bi_list.csv", "v3").unwrap();
        assert_eq!(columns[0].category, ColumnCategory::DateTime);
        assert_eq!(columns[1].category, ColumnCategory::BooleanLike);
        assert_eq!(columns[2].category, ColumnCategory::NullableIndex);
        assert!(columns[2].optional);
        assert_eq!(columns[3].category, ColumnCategory::Text);
    }

    #[test]
    fn test_from_toml_rejects_duplicate_columns() {
        let err = SchemaRegistry::from_toml(
            r#"
[[version]]
name = "v3"

[[version.artifact]]
name = "zs_list.csv"
columns = ["high", "high"]
"#,
        )
        .unwrap_err();

        assert!(matches!(err, ReconcileError::Config(_)));
    }

    #[test]
    fn test_from_toml_rejects_empty_file() {
        assert!(matches!(SchemaRegistry::from_toml(""), Err(ReconcileError::Config(_))));
        assert!(matches!(SchemaRegistry::from_toml("version = 3"), Err(ReconcileError::Config(_))));
    }
}
