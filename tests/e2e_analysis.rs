// LogTally - tests/e2e_analysis.rs
//
// End-to-end tests for the classification pipeline.
//
// These tests exercise the real filesystem, real YAML rule loading,
// real regex compilation, and real streaming reads — no mocks, no
// stubs. This exercises the full path from a rules document and a raw
// log file on disk to sorted per-rule results and rendered reports.

use logtally::core::analyzer::ExecutionMode;
use logtally::core::result::RuleMatches;
use logtally::core::{export, rules};
use std::fs;
use std::io::BufReader;
use std::path::PathBuf;

// =============================================================================
// Helpers
// =============================================================================

/// Absolute path to the on-disk fixture files.
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture_analyzer() -> logtally::core::analyzer::Analyzer {
    let doc = fs::read_to_string(fixture("rules.yaml")).unwrap();
    rules::analyzer_from_config(Some(&doc))
}

fn by_name<'a>(results: &'a [RuleMatches], name: &str) -> &'a RuleMatches {
    results
        .iter()
        .find(|r| r.rule_name == name)
        .unwrap_or_else(|| panic!("no result for rule '{name}' in {results:?}"))
}

// =============================================================================
// Fixture classification E2E
// =============================================================================

/// The rules fixture classifies the sample build log with the expected
/// per-rule counts and display-name ordering.
#[test]
fn e2e_fixture_rules_classify_sample_log() {
    let analyzer = fixture_analyzer();
    assert_eq!(analyzer.rule_count(), 3);

    let content = fs::read_to_string(fixture("build_sample.log")).unwrap();
    let results = analyzer.analyze_sequential(Some(&content));

    assert_eq!(results.len(), 3);

    // Sorted ascending by display name, case-sensitive: uppercase sorts
    // before lowercase, so "deprecated" (no showName) comes last.
    let display: Vec<&str> = results.iter().map(|r| r.display_name.as_str()).collect();
    assert_eq!(display, ["Error", "Warning", "deprecated"]);

    assert_eq!(by_name(&results, "error").count(), 2);
    assert_eq!(by_name(&results, "warning").count(), 2);
    assert_eq!(by_name(&results, "deprecated").count(), 1);

    // Matched lines are the original untrimmed text, in input order.
    assert_eq!(
        by_name(&results, "error").matched_lines(),
        [
            "src/main.c:10: error: expected ';' before return",
            "ERROR: link failed",
        ]
    );
}

/// Streaming a real file produces exactly the blob-mode results,
/// order included.
#[test]
fn e2e_stream_file_matches_blob() {
    let analyzer = fixture_analyzer();

    let content = fs::read_to_string(fixture("build_sample.log")).unwrap();
    let blob = analyzer.analyze_sequential(Some(&content));

    let file = fs::File::open(fixture("build_sample.log")).unwrap();
    let stream = analyzer.analyze_reader(BufReader::new(file)).unwrap();

    assert_eq!(blob, stream);
}

/// Parallel execution over a generated large log agrees with sequential
/// execution on membership and counts for every rule.
#[test]
fn e2e_parallel_large_log_agrees_with_sequential() {
    let analyzer = fixture_analyzer();

    let mut log = String::new();
    for i in 0..5_000 {
        match i % 5 {
            0 => log.push_str(&format!("step {i}: error: transient failure\n")),
            1 => log.push_str(&format!("step {i}: warning: slow response\n")),
            2 => log.push_str("\n"),
            _ => log.push_str(&format!("step {i}: ok\n")),
        }
    }

    let sequential = analyzer.analyze_with(Some(&log), ExecutionMode::Sequential);
    let parallel = analyzer.analyze_with(Some(&log), ExecutionMode::Parallel);

    assert_eq!(sequential.len(), parallel.len());
    for (s, p) in sequential.iter().zip(&parallel) {
        assert_eq!(s.rule_name, p.rule_name);
        assert_eq!(s.count(), p.count(), "rule {}", s.rule_name);

        let mut s_lines = s.matched_lines().to_vec();
        let mut p_lines = p.matched_lines().to_vec();
        s_lines.sort();
        p_lines.sort();
        assert_eq!(s_lines, p_lines, "rule {}", s.rule_name);
    }

    assert_eq!(by_name(&sequential, "error").count(), 1_000);
    assert_eq!(by_name(&sequential, "warning").count(), 1_000);
}

// =============================================================================
// Fallback E2E
// =============================================================================

/// A garbage rules document falls back to the built-in default rules,
/// which still classify a build log.
#[test]
fn e2e_garbage_rules_fall_back_to_defaults() {
    let analyzer = rules::analyzer_from_config(Some("{{{ not yaml"));

    let names: Vec<&str> = analyzer.rules().iter().map(|r| r.name()).collect();
    assert_eq!(names, ["error", "warning", "info"]);

    let results = analyzer.analyze_sequential(Some("fatal error: out of memory\n"));
    assert_eq!(by_name(&results, "error").count(), 1);
}

// =============================================================================
// Report export E2E
// =============================================================================

/// Full round trip: analyse a log written to a temp dir, export the JSON
/// report to disk, read it back, and verify its contents.
#[test]
fn e2e_json_report_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("nightly.log");
    fs::write(&log_path, "error: step failed\nwarning: low disk\nok\n").unwrap();

    let analyzer = fixture_analyzer();
    let content = fs::read_to_string(&log_path).unwrap();
    let results = analyzer.analyze_sequential(Some(&content));

    let report_path = dir.path().join("report.json");
    let file = fs::File::create(&report_path).unwrap();
    export::export_json(&results, "nightly.log", file, &report_path).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();

    assert_eq!(value["source"], "nightly.log");
    assert_eq!(value["rule_count"], 3);
    assert_eq!(value["total_matches"], 2);

    let error = value["results"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["rule_name"] == "error")
        .unwrap();
    assert_eq!(error["count"], 1);
    assert_eq!(error["matched_lines"][0], "error: step failed");
}

/// CSV summary export includes a row for every rule, zero-count included.
#[test]
fn e2e_csv_summary_enumerates_every_rule() {
    let analyzer = fixture_analyzer();
    let results = analyzer.analyze_sequential(Some("nothing matches here\n"));

    let mut buf = Vec::new();
    export::export_csv_summary(&results, &mut buf, &PathBuf::from("summary.csv")).unwrap();
    let text = String::from_utf8(buf).unwrap();

    assert_eq!(text.lines().count(), 4); // header + 3 rules
    assert!(text.contains("error,Error,0"));
    assert!(text.contains("warning,Warning,0"));
    assert!(text.contains("deprecated,deprecated,0"));
}
