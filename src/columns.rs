// 🏷️ Column Layer - comparison columns and their categories
// A category is attached to every column when its schema is registered;
// it decides which normalization the comparator applies.

use serde::{Deserialize, Serialize};

// ============================================================================
// COLUMN CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnCategory {
    /// Timestamps; date-only and minute-precision forms collapse to one canonical string
    #[serde(rename = "datetime")]
    DateTime,
    /// Free text; compared after trimming
    Text,
    /// Composite signal tags such as "1,2" / "1_2"
    EnumTag,
    /// Optional link to a parent or related entity; absent on both sides always matches
    NullableIndex,
    /// Confirmed/provisional style flags; case-insensitive
    BooleanLike,
    /// Measures and indices; trimmed, numbers compared by value
    Plain,
}

impl ColumnCategory {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnCategory::DateTime => "datetime",
            ColumnCategory::Text => "text",
            ColumnCategory::EnumTag => "enum_tag",
            ColumnCategory::NullableIndex => "nullable_index",
            ColumnCategory::BooleanLike => "boolean_like",
            ColumnCategory::Plain => "plain",
        }
    }

    /// Default category for a column registered without one.
    ///
    /// Built-in schemas never rely on this; it only fills the gap for
    /// user-supplied schema files.
    pub fn infer(column: &str) -> ColumnCategory {
        let lower = column.to_lowercase();

        if lower.starts_with("parent_seg_") || lower.starts_with("relate_bsp") {
            ColumnCategory::NullableIndex
        } else if lower.contains("time") || lower.contains("clock") {
            ColumnCategory::DateTime
        } else if lower == "bsp_type" {
            ColumnCategory::EnumTag
        } else if lower.starts_with("is_") {
            ColumnCategory::BooleanLike
        } else if lower == "reason" || lower == "fx" {
            ColumnCategory::Text
        } else {
            ColumnCategory::Plain
        }
    }
}

impl std::fmt::Display for ColumnCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// COLUMN SPEC
// ============================================================================

/// One comparison column of an artifact schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub category: ColumnCategory,

    /// Optional columns may be absent from both tables; absent from one is still a mismatch
    #[serde(default)]
    pub optional: bool,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, category: ColumnCategory) -> Self {
        ColumnSpec {
            name: name.into(),
            category,
            optional: false,
        }
    }

    /// Column whose category comes from [`ColumnCategory::infer`]
    pub fn inferred(name: impl Into<String>) -> Self {
        let name = name.into();
        let category = ColumnCategory::infer(&name);
        ColumnSpec::new(name, category)
    }

    /// Builder: mark column optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_temporal_columns() {
        assert_eq!(ColumnCategory::infer("begin_time"), ColumnCategory::DateTime);
        assert_eq!(ColumnCategory::infer("end_bi_begin_klu_time"), ColumnCategory::DateTime);
        assert_eq!(ColumnCategory::infer("clock"), ColumnCategory::DateTime);
        assert_eq!(ColumnCategory::infer("end_clock"), ColumnCategory::DateTime);
    }

    #[test]
    fn test_infer_linkage_columns_before_time() {
        // relate_bsp1_time contains "time" but is an optional linkage
        assert_eq!(ColumnCategory::infer("relate_bsp1_time"), ColumnCategory::NullableIndex);
        assert_eq!(ColumnCategory::infer("relate_bsp1"), ColumnCategory::NullableIndex);
        assert_eq!(ColumnCategory::infer("parent_seg_dir"), ColumnCategory::NullableIndex);
    }

    #[test]
    fn test_infer_special_columns() {
        assert_eq!(ColumnCategory::infer("bsp_type"), ColumnCategory::EnumTag);
        assert_eq!(ColumnCategory::infer("is_sure"), ColumnCategory::BooleanLike);
        assert_eq!(ColumnCategory::infer("reason"), ColumnCategory::Text);
        assert_eq!(ColumnCategory::infer("high"), ColumnCategory::Plain);
    }

    #[test]
    fn test_category_serde_names() {
        let spec: ColumnSpec =
            serde_json::from_str(r#"{"name":"bsp_type","category":"enum_tag"}"#).unwrap();
        assert_eq!(spec.category, ColumnCategory::EnumTag);
        assert!(!spec.optional);
        assert_eq!(spec.category.to_string(), "enum_tag");
    }
}
