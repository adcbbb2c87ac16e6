use std::fs;
use std::path::Path;

use chan_parity::{
    check_file, consistency_check, ArtifactOutcome, ConsistencyCheck, ReconcileError, SchemaRegistry,
    Side, TableReconciler,
};
use tempfile::TempDir;

const KLINE_HEADER: &str = "begin_time,end_time,idx,dir,high,low,fx";

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn create_test_dirs() -> (TempDir, TempDir) {
    (TempDir::new().unwrap(), TempDir::new().unwrap())
}

fn kline_rows(rows: &[&str]) -> String {
    let mut content = format!("{}\n", KLINE_HEADER);
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    content
}

// -------------------------------------------------------------------------
// Directory reconciliation
// -------------------------------------------------------------------------

#[test]
fn identical_artifact_across_formats() {
    let (a, b) = create_test_dirs();
    write(a.path(), "kline_list.csv", &kline_rows(&["2024-01-08 00:00:00,2024-01-08 09:30:00,0,1,10.5,9.0,top"]));
    write(b.path(), "kline_list.csv", &kline_rows(&["2024/01/08,2024-01-08 09:30,0.0,1,10.50,9,top"]));

    let registry = SchemaRegistry::builtin();
    let reconciler = TableReconciler::new(&registry, Some("v2")).unwrap();
    let report = reconciler
        .reconcile_dirs(a.path(), b.path(), &["kline_list.csv".to_string()])
        .unwrap();

    assert_eq!(report.artifacts.len(), 1);
    assert!(report.is_clean());
    assert!(matches!(report.artifacts[0].outcome, ArtifactOutcome::Identical { rows: 1 }));
}

#[test]
fn one_bad_artifact_does_not_stop_the_run() {
    let (a, b) = create_test_dirs();
    write(a.path(), "kline_list.csv", &kline_rows(&["2024-01-08,2024-01-08,0,1,10,9,top"]));
    write(b.path(), "kline_list.csv", &kline_rows(&["2024-01-08,2024-01-08,0,1,10,9,top"]));

    // ragged row on side B
    write(a.path(), "zs_list.csv", "begin_time,high\n2024-01-08,1\n");
    write(b.path(), "zs_list.csv", "begin_time,high\n2024-01-08,1,extra\n");

    // bi_list.csv only on side A
    write(a.path(), "bi_list.csv", "begin_time\n2024-01-08\n");

    let registry = SchemaRegistry::builtin();
    let reconciler = TableReconciler::new(&registry, None).unwrap();
    let report = reconciler.reconcile_dirs(a.path(), b.path(), &[]).unwrap();

    let names: Vec<&str> = report.artifacts.iter().map(|r| r.artifact.as_str()).collect();
    assert_eq!(names.len(), 11);
    assert_eq!(&names[..4], &["kline_list.csv", "bi_list.csv", "seg_list.csv", "zs_list.csv"]);

    assert!(report.artifact("kline_list.csv").unwrap().is_identical());
    assert!(matches!(
        report.artifact("bi_list.csv").unwrap().outcome,
        ArtifactOutcome::MissingArtifact { side: Side::B, .. }
    ));
    assert!(matches!(
        report.artifact("zs_list.csv").unwrap().outcome,
        ArtifactOutcome::LoadFailed { side: Side::B, .. }
    ));

    let summary = report.summary();
    assert_eq!(summary.identical, 1);
    assert_eq!(summary.skipped, 10);
    assert!(!report.is_clean());
}

#[test]
fn schema_mismatch_is_reported_per_artifact() {
    let (a, b) = create_test_dirs();
    write(a.path(), "kline_list.csv", &kline_rows(&["2024-01-08,2024-01-08,0,1,10,9,top"]));
    write(b.path(), "kline_list.csv", "begin_time,end_time,idx,dir,high,low\n2024-01-08,2024-01-08,0,1,10,9\n");

    let registry = SchemaRegistry::builtin();
    let reconciler = TableReconciler::new(&registry, None).unwrap();
    let report = reconciler
        .reconcile_dirs(a.path(), b.path(), &["kline_list.csv".to_string()])
        .unwrap();

    match &report.artifacts[0].outcome {
        ArtifactOutcome::SchemaMismatch { missing_a, missing_b } => {
            assert!(missing_a.is_empty());
            assert_eq!(missing_b, &vec!["fx".to_string()]);
        }
        other => panic!("expected schema mismatch, got {:?}", other),
    }
}

#[test]
fn schema_mismatch_leaves_other_artifacts_untouched() {
    let (a, b) = create_test_dirs();
    write(a.path(), "kline_list.csv", &kline_rows(&["2024-01-08,2024-01-08,0,1,10,9,top"]));
    write(b.path(), "kline_list.csv", &kline_rows(&["2024/01/08,2024-01-08 00:00,0,1,10.0,9,top"]));

    // zs_list.csv on side A lacks peak_high
    let zs_full = "begin_time,end_time,high,low,peak_high,peak_low,is_sure,begin_bi_idx,end_bi_idx,bi_in,bi_out,sub_zs_count\n\
                   2024-01-08,2024-01-09,10,9,11,8,True,0,2,0,3,0\n";
    let zs_short = "begin_time,end_time,high,low,peak_low,is_sure,begin_bi_idx,end_bi_idx,bi_in,bi_out,sub_zs_count\n\
                    2024-01-08,2024-01-09,10,9,8,True,0,2,0,3,0\n";
    write(a.path(), "zs_list.csv", zs_short);
    write(b.path(), "zs_list.csv", zs_full);

    let registry = SchemaRegistry::builtin();
    let reconciler = TableReconciler::new(&registry, Some("v2")).unwrap();
    let selection = vec!["zs_list.csv".to_string(), "kline_list.csv".to_string()];
    let report = reconciler.reconcile_dirs(a.path(), b.path(), &selection).unwrap();

    let names: Vec<&str> = report.artifacts.iter().map(|r| r.artifact.as_str()).collect();
    assert_eq!(names, vec!["kline_list.csv", "zs_list.csv"]);

    assert!(matches!(
        report.artifact("kline_list.csv").unwrap().outcome,
        ArtifactOutcome::Identical { rows: 1 }
    ));
    match &report.artifact("zs_list.csv").unwrap().outcome {
        ArtifactOutcome::SchemaMismatch { missing_a, missing_b } => {
            assert_eq!(missing_a, &vec!["peak_high".to_string()]);
            assert!(missing_b.is_empty());
        }
        other => panic!("expected schema mismatch, got {:?}", other),
    }

    let summary = report.summary();
    assert_eq!(summary.identical, 1);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn short_row_is_compared_with_empty_cells() {
    let (a, b) = create_test_dirs();
    write(a.path(), "kline_list.csv", &kline_rows(&["2024-01-08,2024-01-08,0,1,10,9,top"]));
    write(b.path(), "kline_list.csv", &kline_rows(&["2024-01-08,2024-01-08,0,1,10,9"]));

    let registry = SchemaRegistry::builtin();
    let reconciler = TableReconciler::new(&registry, Some("v2")).unwrap();
    let report = reconciler
        .reconcile_dirs(a.path(), b.path(), &["kline_list.csv".to_string()])
        .unwrap();

    let diffs = report.artifacts[0].outcome.diffs();
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].columns.len(), 1);
    assert_eq!(diffs[0].columns[0].column, "fx");

    let text = chan_parity::render_run(&report);
    assert!(text.contains("    fx: A=top, B=<empty>\n"));
}

#[test]
fn differences_report_one_based_rows() {
    let (a, b) = create_test_dirs();
    write(
        a.path(),
        "kline_list.csv",
        &kline_rows(&["2024-01-08,2024-01-08,0,1,10,9,top", "2024-01-09,2024-01-09,1,-1,11,8,bottom"]),
    );
    write(
        b.path(),
        "kline_list.csv",
        &kline_rows(&["2024-01-08,2024-01-08,0,1,10,9,top", "2024-01-09,2024-01-09,1,-1,11,7.5,bottom"]),
    );

    let registry = SchemaRegistry::builtin();
    let reconciler = TableReconciler::new(&registry, Some("v2")).unwrap();
    let report = reconciler
        .reconcile_dirs(a.path(), b.path(), &["kline_list.csv".to_string()])
        .unwrap();

    let diffs = report.artifacts[0].outcome.diffs();
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].row, 2);
    assert_eq!(diffs[0].columns[0].column, "low");

    let text = chan_parity::render_run(&report);
    assert!(text.contains("  row 2:\n    low: A=8, B=7.5\n"));
}

#[test]
fn missing_root_is_fatal() {
    let a = TempDir::new().unwrap();
    let registry = SchemaRegistry::builtin();
    let reconciler = TableReconciler::new(&registry, None).unwrap();

    let result = reconciler.reconcile_dirs(a.path(), &a.path().join("absent"), &[]);
    assert!(matches!(result, Err(ReconcileError::MissingPath(_))));
}

#[test]
fn unknown_artifact_selection_is_rejected() {
    let (a, b) = create_test_dirs();
    let registry = SchemaRegistry::builtin();
    let reconciler = TableReconciler::new(&registry, Some("v1")).unwrap();

    // history artifacts only exist from v2 on
    let result = reconciler.reconcile_dirs(a.path(), b.path(), &["bs_point_history.csv".to_string()]);
    assert!(matches!(result, Err(ReconcileError::UnknownArtifact { .. })));
}

#[test]
fn toml_schema_drives_a_run() {
    let (a, b) = create_test_dirs();
    let schema_dir = TempDir::new().unwrap();
    write(
        schema_dir.path(),
        "schema.toml",
        r#"
[[version]]
name = "v3"

[[version.artifact]]
name = "signals.csv"
columns = ["begin_time", "bsp_type", { name = "extra", category = "plain", optional = true }]
"#,
    );
    write(a.path(), "signals.csv", "begin_time,bsp_type\n2024-01-08 00:00,\"1,2\"\n");
    write(b.path(), "signals.csv", "bsp_type,begin_time\n1_2,2024-01-08\n");

    let registry = chan_parity::load_registry(Some(&schema_dir.path().join("schema.toml"))).unwrap();
    let reconciler = TableReconciler::new(&registry, None).unwrap();
    let report = reconciler.reconcile_dirs(a.path(), b.path(), &[]).unwrap();

    assert_eq!(report.version, "v3");
    assert!(report.is_clean());
}

// -------------------------------------------------------------------------
// Consistency check on a file
// -------------------------------------------------------------------------

const HISTORY_HEADER: &str = "begin_time,bsp_type,is_buy,relate_bsp1,bi_idx,bi_begin_time,bi_end_time,klu_idx";

#[test]
fn check_file_writes_sorted_inconsistent_rows() {
    let dir = TempDir::new().unwrap();
    let content = format!(
        "{}\n{}\n{}\n{}\n{}\n{}\n",
        HISTORY_HEADER,
        "2024-01-09 00:00,1,True,,3,2024-01-05,2024-01-09,10",
        "2024-01-08 00:00,1,True,,2,2024-01-02,2024-01-08,7",
        "2024-01-08 00:00:00,1,true,,2,2024-01-02,2024-01-08 00:00,8",
        "2024/01/08,2,True,,2,2024-01-02,2024-01-08,9",
        "2024-01-09,1,True,,3,2024-01-05,2024-01-09,11",
    );
    write(dir.path(), "bs_point_history.csv", &content);

    let input = dir.path().join("bs_point_history.csv");
    let report = check_file(&input, &ConsistencyCheck::signal_history()).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.inconsistent_rows, 3);

    let output = dir.path().join("bs_point_history_inconsistent.csv");
    assert_eq!(report.output.as_deref(), Some(output.as_path()));

    let written = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], HISTORY_HEADER);
    assert_eq!(lines.len(), 4);
    assert!(lines[1..].iter().all(|l| l.starts_with("2024-01-08,")));

    let text = chan_parity::render_consistency(&report);
    assert!(text.starts_with("Found 3 inconsistent rows in 1 groups. Results saved to "));
}

#[test]
fn check_file_consistent_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "h.csv",
        "begin_time,dir,high\n2024-01-08,1,10\n2024-01-08 00:00,1,10.0\n",
    );

    let check = consistency_check(None, Some("dir,high")).unwrap();
    let report = check_file(&dir.path().join("h.csv"), &check).unwrap();

    assert!(report.is_consistent());
    assert!(report.output.is_none());
    assert!(!dir.path().join("h_inconsistent.csv").exists());
    assert_eq!(chan_parity::render_consistency(&report), "No inconsistencies found.\n");
}

#[test]
fn check_file_missing_column() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "h.csv", "begin_time,bsp_type\n2024-01-08,1\n");

    let result = check_file(&dir.path().join("h.csv"), &ConsistencyCheck::signal_history());
    match result {
        Err(err @ ReconcileError::SchemaMismatch { .. }) => {
            assert!(err.to_string().starts_with("h.csv is missing column(s): is_buy"));
            if let ReconcileError::SchemaMismatch { artifact, missing } = err {
                assert_eq!(artifact, "h.csv");
                assert!(missing.contains(&"is_buy".to_string()));
            }
        }
        other => panic!("expected schema mismatch, got {:?}", other),
    }
}
