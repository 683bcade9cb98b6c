// LogTally - core/analyzer.rs
//
// The classification engine: holds an immutable rule list and scans log
// content line by line, accumulating per-rule results.
// Core layer: accepts strings and BufRead sources, never opens files.
//
// Concurrency model: each analyze call is a bounded, synchronous unit of
// work. The parallel variants fan line-processing out across the rayon
// pool for the duration of the call only, then join before returning.
// Rules are read-only during a pass; per-worker accumulators are merged
// at the end, so no result is ever written by two workers through a lock.

use crate::core::result::RuleMatches;
use crate::core::rule::Rule;
use crate::util::constants;
use crate::util::error::AnalyzeError;
use rayon::prelude::*;
use std::io::BufRead;

// =============================================================================
// Execution mode
// =============================================================================

/// How line scanning is executed.
///
/// Both modes produce identical rule/count/membership results; only the
/// encounter order of matched lines *within* a rule's result may differ
/// under `Parallel`. `Sequential` guarantees strict input-line order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Single-threaded scan preserving input-line order per rule.
    Sequential,

    /// Rayon fan-out across worker threads; intra-rule line order is
    /// unspecified.
    Parallel,
}

impl ExecutionMode {
    /// Selection policy: parallel scanning pays off for large inputs or
    /// many rules, otherwise the fan-out overhead dominates.
    ///
    /// Callers that know better (e.g. tests needing deterministic order)
    /// pass a mode explicitly instead.
    pub fn choose(input_bytes: u64, rule_count: usize) -> Self {
        if input_bytes >= constants::PARALLEL_MIN_INPUT_BYTES
            || rule_count > constants::PARALLEL_MIN_RULES
        {
            Self::Parallel
        } else {
            Self::Sequential
        }
    }
}

// =============================================================================
// Analyzer
// =============================================================================

/// Holds a rule list and classifies log content against it.
///
/// The rule list is immutable for the analyzer's lifetime. Every `analyze`
/// call produces a fresh result set; no state is carried between calls.
#[derive(Debug, Clone)]
pub struct Analyzer {
    rules: Vec<Rule>,
}

impl Analyzer {
    /// Create an analyzer over the given rules.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The held rules (read-only).
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of configured rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// True when at least one rule is configured.
    pub fn has_rules(&self) -> bool {
        !self.rules.is_empty()
    }

    // -------------------------------------------------------------------------
    // Blob analysis
    // -------------------------------------------------------------------------

    /// Analyze a complete log text, selecting the execution mode by the
    /// input-size/rule-count policy.
    ///
    /// `None` means "no log available" and yields an empty result vec, as
    /// does an empty rule list. An *empty or whitespace-only* log is
    /// different: every rule is still reported, with zero matches.
    pub fn analyze(&self, content: Option<&str>) -> Vec<RuleMatches> {
        let mode = match content {
            Some(text) => ExecutionMode::choose(text.len() as u64, self.rules.len()),
            None => ExecutionMode::Sequential, // moot, returns empty below
        };
        self.analyze_with(content, mode)
    }

    /// Analyze a complete log text with an explicit execution mode.
    pub fn analyze_with(&self, content: Option<&str>, mode: ExecutionMode) -> Vec<RuleMatches> {
        let Some(content) = content else {
            return Vec::new();
        };
        if self.rules.is_empty() {
            return Vec::new();
        }

        // Blank content: skip scanning entirely but still enumerate every
        // rule with a zero count.
        if content.trim().is_empty() {
            return sort_results(self.seed_results());
        }

        let results = match mode {
            ExecutionMode::Sequential => self.scan_sequential(content.lines()),
            ExecutionMode::Parallel => {
                let lines: Vec<&str> = content
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .collect();
                self.scan_parallel(&lines)
            }
        };

        sort_results(results)
    }

    /// Analyze a complete log text single-threaded, preserving strict
    /// input-line order within each rule's matched lines.
    pub fn analyze_sequential(&self, content: Option<&str>) -> Vec<RuleMatches> {
        self.analyze_with(content, ExecutionMode::Sequential)
    }

    // -------------------------------------------------------------------------
    // Stream analysis
    // -------------------------------------------------------------------------

    /// Analyze an incremental line source with bounded memory.
    ///
    /// Lines are scanned as they are read; the full content is never
    /// materialised. A read failure mid-stream propagates to the caller —
    /// this is the only error that escapes the core. Results preserve
    /// strict input-line order (the streaming baseline is sequential).
    pub fn analyze_reader<R: BufRead>(
        &self,
        reader: R,
    ) -> Result<Vec<RuleMatches>, AnalyzeError> {
        if self.rules.is_empty() {
            return Ok(Vec::new());
        }

        let mut results = self.seed_results();
        let mut lines_scanned: u64 = 0;

        for line in reader.lines() {
            let line = line.map_err(|e| AnalyzeError::SourceRead { source: e })?;
            if line.trim().is_empty() {
                continue;
            }
            lines_scanned += 1;
            for (idx, rule) in self.rules.iter().enumerate() {
                if rule.matches(&line) {
                    results[idx].add_matched_line(line.clone());
                }
            }
        }

        tracing::debug!(lines = lines_scanned, rules = self.rules.len(), "Stream scan complete");
        Ok(sort_results(results))
    }

    /// Analyze a line source with parallel fan-out.
    ///
    /// Trades memory for throughput: all non-blank lines are materialised
    /// first, then scanned across the rayon pool. Use `analyze_reader`
    /// when bounded memory matters more than speed; the choice is the
    /// caller's policy, typically via `ExecutionMode::choose`.
    pub fn analyze_reader_parallel<R: BufRead>(
        &self,
        reader: R,
    ) -> Result<Vec<RuleMatches>, AnalyzeError> {
        if self.rules.is_empty() {
            return Ok(Vec::new());
        }

        let mut lines: Vec<String> = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| AnalyzeError::SourceRead { source: e })?;
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }

        let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        Ok(sort_results(self.scan_parallel(&line_refs)))
    }

    // -------------------------------------------------------------------------
    // Scanning internals
    // -------------------------------------------------------------------------

    /// One result per rule, seeded with the rule's display name and zero
    /// matches. Indexed parallel to `self.rules`.
    fn seed_results(&self) -> Vec<RuleMatches> {
        self.rules
            .iter()
            .map(|rule| RuleMatches::new(rule.name(), rule.display_name()))
            .collect()
    }

    /// Sequential scan over an iterator of lines. Blank lines are skipped
    /// before any rule sees them; matched lines are recorded untrimmed in
    /// encounter order.
    fn scan_sequential<'a>(&self, lines: impl Iterator<Item = &'a str>) -> Vec<RuleMatches> {
        let mut results = self.seed_results();

        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            for (idx, rule) in self.rules.iter().enumerate() {
                if rule.matches(line) {
                    results[idx].add_matched_line(line);
                }
            }
        }

        results
    }

    /// Parallel scan over pre-filtered non-blank lines.
    ///
    /// Each worker folds matches into its own per-rule buckets; the
    /// buckets are merged pairwise at the end. Membership and counts are
    /// identical to the sequential scan; only intra-rule arrival order
    /// can differ, which the analyze contract permits for parallel runs.
    fn scan_parallel(&self, lines: &[&str]) -> Vec<RuleMatches> {
        let rule_count = self.rules.len();

        let buckets: Vec<Vec<String>> = lines
            .par_iter()
            .fold(
                || vec![Vec::new(); rule_count],
                |mut acc, line| {
                    for (idx, rule) in self.rules.iter().enumerate() {
                        if rule.matches(line) {
                            acc[idx].push((*line).to_string());
                        }
                    }
                    acc
                },
            )
            .reduce(
                || vec![Vec::new(); rule_count],
                |mut left, right| {
                    for (dst, src) in left.iter_mut().zip(right) {
                        dst.extend(src);
                    }
                    left
                },
            );

        let mut results = self.seed_results();
        for (result, bucket) in results.iter_mut().zip(buckets) {
            result.extend_matched_lines(bucket);
        }
        results
    }
}

/// Sort results ascending by display name (lexicographic, case-sensitive).
/// `sort_by` is stable, so ties keep their insertion order.
fn sort_results(mut results: Vec<RuleMatches>) -> Vec<RuleMatches> {
    results.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn test_rules() -> Vec<Rule> {
        vec![
            Rule::with_patterns("error", "Error", vec!["/(?i)error/".to_string()]),
            Rule::with_patterns("warning", "Warning", vec!["/(?i)warning/".to_string()]),
        ]
    }

    const SAMPLE: &str = "ERROR: fail\nwarning: be careful\nnormal line\nerror: again\n";

    fn by_name<'a>(results: &'a [RuleMatches], name: &str) -> &'a RuleMatches {
        results
            .iter()
            .find(|r| r.rule_name == name)
            .unwrap_or_else(|| panic!("no result for rule '{name}'"))
    }

    #[test]
    fn test_analyze_counts() {
        let analyzer = Analyzer::new(test_rules());
        let results = analyzer.analyze(Some(SAMPLE));

        assert_eq!(results.len(), 2);
        assert_eq!(by_name(&results, "error").count(), 2);
        assert_eq!(by_name(&results, "warning").count(), 1);
    }

    #[test]
    fn test_analyze_none_returns_empty() {
        let analyzer = Analyzer::new(test_rules());
        assert!(analyzer.analyze(None).is_empty());
    }

    #[test]
    fn test_analyze_no_rules_returns_empty() {
        let analyzer = Analyzer::new(Vec::new());
        assert!(analyzer.analyze(Some(SAMPLE)).is_empty());
        assert!(!analyzer.has_rules());
        assert_eq!(analyzer.rule_count(), 0);
    }

    #[test]
    fn test_analyze_empty_content_enumerates_all_rules() {
        let analyzer = Analyzer::new(test_rules());

        for content in ["", "   ", "\n\n  \n"] {
            let results = analyzer.analyze(Some(content));
            assert_eq!(results.len(), 2, "content {content:?}");
            assert!(results.iter().all(|r| r.count() == 0));
        }
    }

    #[test]
    fn test_results_sorted_by_display_name() {
        // Configure in reverse display order; output must be Error first.
        let rules = vec![
            Rule::with_patterns("warning", "Warning", vec!["/warning/".to_string()]),
            Rule::with_patterns("error", "Error", vec!["/error/".to_string()]),
        ];
        let analyzer = Analyzer::new(rules);
        let results = analyzer.analyze(Some("error\nwarning\n"));

        let names: Vec<&str> = results.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, ["Error", "Warning"]);
    }

    #[test]
    fn test_sort_stable_for_equal_display_names() {
        let rules = vec![
            Rule::with_patterns("second", "Same", vec!["/b/".to_string()]),
            Rule::with_patterns("first", "Same", vec!["/a/".to_string()]),
        ];
        let analyzer = Analyzer::new(rules);
        let results = analyzer.analyze_sequential(Some("ab\n"));

        // Insertion order breaks the tie: "second" was configured first.
        assert_eq!(results[0].rule_name, "second");
        assert_eq!(results[1].rule_name, "first");
    }

    #[test]
    fn test_sequential_preserves_line_order() {
        let analyzer = Analyzer::new(test_rules());
        let results = analyzer.analyze_sequential(Some(SAMPLE));

        assert_eq!(
            by_name(&results, "error").matched_lines(),
            ["ERROR: fail", "error: again"]
        );
    }

    #[test]
    fn test_matched_lines_keep_original_text() {
        let analyzer = Analyzer::new(test_rules());
        let results = analyzer.analyze_sequential(Some("   error: padded   \n"));

        // The untrimmed original line is recorded.
        assert_eq!(
            by_name(&results, "error").matched_lines(),
            ["   error: padded   "]
        );
    }

    #[test]
    fn test_blank_lines_never_reach_rules() {
        // `.*` matches the empty string, but blank lines are skipped before
        // any rule sees them.
        let rules = vec![Rule::with_patterns("any", "Any", vec!["/.*/".to_string()])];
        let analyzer = Analyzer::new(rules);
        let results = analyzer.analyze_sequential(Some("one\n\n   \ntwo\n"));
        assert_eq!(results[0].count(), 2);
    }

    #[test]
    fn test_parallel_agrees_with_sequential_membership() {
        let analyzer = Analyzer::new(test_rules());

        let sequential = analyzer.analyze_with(Some(SAMPLE), ExecutionMode::Sequential);
        let parallel = analyzer.analyze_with(Some(SAMPLE), ExecutionMode::Parallel);

        assert_eq!(sequential.len(), parallel.len());
        for (s, p) in sequential.iter().zip(&parallel) {
            assert_eq!(s.rule_name, p.rule_name);
            assert_eq!(s.count(), p.count());

            // Membership must be identical; order within a rule may differ.
            let mut s_lines = s.matched_lines().to_vec();
            let mut p_lines = p.matched_lines().to_vec();
            s_lines.sort();
            p_lines.sort();
            assert_eq!(s_lines, p_lines);
        }
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let analyzer = Analyzer::new(test_rules());
        let first = analyzer.analyze_sequential(Some(SAMPLE));
        let second = analyzer.analyze_sequential(Some(SAMPLE));
        assert_eq!(first, second);
    }

    #[test]
    fn test_stream_matches_blob() {
        let analyzer = Analyzer::new(test_rules());

        let blob = analyzer.analyze_sequential(Some(SAMPLE));
        let stream = analyzer.analyze_reader(Cursor::new(SAMPLE)).unwrap();

        // Order included: the streaming baseline is sequential.
        assert_eq!(blob, stream);
    }

    #[test]
    fn test_stream_parallel_membership() {
        let analyzer = Analyzer::new(test_rules());

        let sequential = analyzer.analyze_reader(Cursor::new(SAMPLE)).unwrap();
        let parallel = analyzer
            .analyze_reader_parallel(Cursor::new(SAMPLE))
            .unwrap();

        for (s, p) in sequential.iter().zip(&parallel) {
            assert_eq!(s.count(), p.count());
        }
    }

    #[test]
    fn test_stream_read_failure_propagates() {
        use std::io::{self, Read};

        /// Reader that fails after yielding some bytes.
        struct BrokenReader {
            served: bool,
        }

        impl Read for BrokenReader {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.served {
                    Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
                } else {
                    self.served = true;
                    let data = b"error: first line\n";
                    buf[..data.len()].copy_from_slice(data);
                    Ok(data.len())
                }
            }
        }

        let analyzer = Analyzer::new(test_rules());
        let reader = io::BufReader::new(BrokenReader { served: false });
        let result = analyzer.analyze_reader(reader);

        assert!(
            matches!(result, Err(AnalyzeError::SourceRead { .. })),
            "expected SourceRead, got {result:?}"
        );
    }

    #[test]
    fn test_stream_empty_input_enumerates_all_rules() {
        let analyzer = Analyzer::new(test_rules());
        let results = analyzer.analyze_reader(Cursor::new("")).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.count() == 0));
    }

    #[test]
    fn test_line_matching_multiple_rules_counted_in_each() {
        let analyzer = Analyzer::new(test_rules());
        let results = analyzer.analyze_sequential(Some("warning: error ahead\n"));
        assert_eq!(by_name(&results, "error").count(), 1);
        assert_eq!(by_name(&results, "warning").count(), 1);
    }

    #[test]
    fn test_execution_mode_policy() {
        use crate::util::constants;

        assert_eq!(ExecutionMode::choose(100, 2), ExecutionMode::Sequential);
        assert_eq!(
            ExecutionMode::choose(constants::PARALLEL_MIN_INPUT_BYTES, 2),
            ExecutionMode::Parallel
        );
        assert_eq!(
            ExecutionMode::choose(100, constants::PARALLEL_MIN_RULES + 1),
            ExecutionMode::Parallel
        );
    }
}
