// 📝 Report Emitter - human-readable rendering of results
// Renders to strings; the binary decides where they go.

use crate::consistency::ConsistencyReport;
use crate::reconciliation::{ArtifactOutcome, ArtifactReport, RunReport};
use crate::schema::SchemaVersion;
use serde::Serialize;

/// One block per artifact, in run order
pub fn render_artifact(report: &ArtifactReport) -> String {
    let name = &report.artifact;

    match &report.outcome {
        ArtifactOutcome::Identical { rows } => format!("{}: identical ({} rows)\n", name, rows),

        ArtifactOutcome::RowCountMismatch { a, b } => {
            format!("{}: row count mismatch: A={} B={}\n", name, a, b)
        }

        ArtifactOutcome::Differences { rows, diffs } => {
            let mut out = format!("{}: {} of {} rows differ\n", name, diffs.len(), rows);
            for diff in diffs {
                out.push_str(&format!("  row {}:\n", diff.row));
                for column in &diff.columns {
                    out.push_str(&format!("    {}: A={}, B={}\n", column.column, column.a, column.b));
                }
            }
            out
        }

        ArtifactOutcome::MissingArtifact { side, path } => {
            format!("{}: missing from {} ({}), skipped\n", name, side, path.display())
        }

        ArtifactOutcome::SchemaMismatch { missing_a, missing_b } => {
            let mut parts = Vec::new();
            if !missing_a.is_empty() {
                parts.push(format!("A lacks {}", missing_a.join(", ")));
            }
            if !missing_b.is_empty() {
                parts.push(format!("B lacks {}", missing_b.join(", ")));
            }
            format!("{}: schema mismatch: {}, skipped\n", name, parts.join("; "))
        }

        ArtifactOutcome::LoadFailed { side, message } => {
            format!("{}: failed to load {}: {}, skipped\n", name, side, message)
        }
    }
}

pub fn render_run(report: &RunReport) -> String {
    let mut out = format!(
        "Comparing A={} with B={} (schema {})\n\n",
        report.dir_a.display(),
        report.dir_b.display(),
        report.version
    );

    for artifact in &report.artifacts {
        out.push_str(&render_artifact(artifact));
    }

    let summary = report.summary();
    out.push_str(&format!(
        "\n{} identical, {} differing, {} row count mismatch(es), {} skipped\n",
        summary.identical, summary.differing, summary.row_count_mismatches, summary.skipped
    ));
    out
}

pub fn render_consistency(report: &ConsistencyReport) -> String {
    let output = match (&report.output, report.is_consistent()) {
        (Some(path), false) => path,
        _ => return "No inconsistencies found.\n".to_string(),
    };

    let mut out = format!(
        "Found {} inconsistent rows in {} groups. Results saved to {}\n\nInconsistent rows:\n",
        report.inconsistent_rows,
        report.groups.len(),
        output.display()
    );
    out.push_str(&render_grid(&report.columns, &report.rows));
    out
}

/// Left-aligned columns, padded to the widest cell
fn render_grid(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(header);
    for row in rows {
        out.push_str(&line(row));
    }
    out
}

/// Registered artifacts and the category of every column
pub fn render_schema(version: &SchemaVersion) -> String {
    let mut out = format!("schema {}\n", version.name);
    for schema in &version.artifacts {
        out.push_str(&format!("  {}\n", schema.artifact));
        let width = schema.columns.iter().map(|c| c.name.len()).max().unwrap_or(0);
        for column in &schema.columns {
            let optional = if column.optional { " (optional)" } else { "" };
            out.push_str(&format!(
                "    {:<width$}  {}{}\n",
                column.name,
                column.category,
                optional,
                width = width
            ));
        }
    }
    out
}

/// Pretty JSON for any report type
pub fn to_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

// ============================================================================
// TESTS
// ============================================================================
