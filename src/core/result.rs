// LogTally - core/result.rs
//
// Per-rule aggregate outcome of a single analysis pass.
// Read-mostly value: the analyzer appends during its pass, consumers only
// read after the pass returns.

/// The matches accumulated for one rule during one analysis pass.
///
/// One `RuleMatches` exists per configured rule, created at the start of
/// the pass even when the rule never fires, so callers can always
/// enumerate every rule in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatches {
    /// Name of the originating rule, copied at creation time.
    pub rule_name: String,

    /// Display name of the originating rule, copied at creation time.
    /// Result ordering is imposed on this field.
    pub display_name: String,

    /// Matched lines in encounter order, original untrimmed text,
    /// duplicates preserved. Append-only during the analysis pass.
    matched_lines: Vec<String>,
}

impl RuleMatches {
    /// Create an empty result for a rule.
    pub fn new(rule_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            display_name: display_name.into(),
            matched_lines: Vec::new(),
        }
    }

    /// Append a matched line. Only the analyzer calls this, during a
    /// single analysis pass.
    pub(crate) fn add_matched_line(&mut self, line: impl Into<String>) {
        self.matched_lines.push(line.into());
    }

    /// Bulk append used by the parallel merge path.
    pub(crate) fn extend_matched_lines(&mut self, lines: Vec<String>) {
        self.matched_lines.extend(lines);
    }

    /// Matched lines in encounter order.
    pub fn matched_lines(&self) -> &[String] {
        &self.matched_lines
    }

    /// Number of matched lines.
    pub fn count(&self) -> usize {
        self.matched_lines.len()
    }

    /// All matched lines joined with newlines (display helper).
    pub fn lines_as_string(&self) -> String {
        self.matched_lines.join("\n")
    }
}
