// LogTally - core/rule.rs
//
// A named matcher compiled from one or more textual patterns.
// Core layer: pure logic, no I/O dependencies.
//
// Failure policy: a single bad pattern never disables its siblings or any
// other rule. Invalid patterns are logged and dropped at compile time, so
// `compiled.len() <= raw_patterns.len()` always holds.

use crate::util::constants;
use crate::util::error::PatternError;
use regex::Regex;

/// A named classification rule: an ordered set of regex patterns plus a
/// human display label.
///
/// A line matches the rule when any compiled pattern finds a match anywhere
/// within it (substring semantics; a pattern may anchor itself with `^`/`$`).
/// A rule whose pattern set is empty, or whose patterns all failed to
/// compile, never matches anything.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Unique rule identifier (the key in the configuration mapping).
    name: String,

    /// Optional human label. `display_name()` falls back to `name`.
    display_name: Option<String>,

    /// Source pattern strings as authored (delimiters included).
    raw_patterns: Vec<String>,

    /// Compiled matchers, kept in sync with `raw_patterns`. Rebuilt in
    /// full on every `set_patterns` call; invalid entries are dropped.
    compiled: Vec<Regex>,
}

impl Rule {
    /// Create a rule with no patterns. It will not match anything until
    /// `set_patterns` is called.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            raw_patterns: Vec::new(),
            compiled: Vec::new(),
        }
    }

    /// Create a rule with a display name and patterns in one step.
    pub fn with_patterns(
        name: impl Into<String>,
        display_name: impl Into<String>,
        patterns: Vec<String>,
    ) -> Self {
        let mut rule = Self::new(name);
        rule.set_display_name(display_name);
        rule.set_patterns(patterns);
        rule
    }

    /// The rule's unique identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The explicit display name if set, else the rule's name.
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Set the human display label.
    pub fn set_display_name(&mut self, display_name: impl Into<String>) {
        self.display_name = Some(display_name.into());
    }

    /// Replace the raw pattern set and recompile everything.
    ///
    /// An empty input clears the rule (it will never match). Patterns that
    /// are blank after cleaning are skipped; patterns that fail to compile
    /// are logged and skipped so the remaining patterns keep working.
    pub fn set_patterns(&mut self, patterns: Vec<String>) {
        self.raw_patterns = patterns;
        self.compile_patterns();
    }

    /// Source patterns as authored (for diagnostics).
    pub fn raw_patterns(&self) -> &[String] {
        &self.raw_patterns
    }

    /// Number of patterns that survived compilation.
    pub fn compiled_pattern_count(&self) -> usize {
        self.compiled.len()
    }

    /// Check whether a log line matches this rule.
    ///
    /// Returns false for blank lines and for rules with no compiled
    /// patterns. The `regex` crate cannot fail during matching, so a match
    /// attempt never aborts the check of the remaining patterns.
    pub fn matches(&self, line: &str) -> bool {
        if line.trim().is_empty() || self.compiled.is_empty() {
            return false;
        }
        self.compiled.iter().any(|re| re.is_match(line))
    }

    /// Rebuild `compiled` from `raw_patterns`, dropping invalid entries.
    fn compile_patterns(&mut self) {
        self.compiled.clear();
        for pattern in &self.raw_patterns {
            let cleaned = clean_pattern(pattern);
            if cleaned.is_empty() {
                continue; // blank after cleaning: nothing to compile
            }
            match compile_pattern(&self.name, cleaned) {
                Ok(re) => self.compiled.push(re),
                Err(e) => {
                    // Silent-skip policy: the bad pattern is diagnostics
                    // only, sibling patterns and other rules keep working.
                    tracing::warn!(error = %e, "Dropping invalid rule pattern");
                }
            }
        }

        tracing::debug!(
            rule = %self.name,
            raw = self.raw_patterns.len(),
            compiled = self.compiled.len(),
            "Rule patterns compiled"
        );
    }
}

/// Clean a raw pattern: trim, then strip exactly one leading and one
/// trailing `/` when both are present (the `/pattern/` configuration
/// convention that marks a string as a regular expression body).
///
/// A lone leading or trailing slash is kept verbatim.
fn clean_pattern(pattern: &str) -> &str {
    let trimmed = pattern.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('/') && trimmed.ends_with('/') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

/// Compile a cleaned pattern with length validation to prevent ReDoS.
fn compile_pattern(rule_name: &str, pattern: &str) -> Result<Regex, PatternError> {
    if pattern.len() > constants::MAX_REGEX_PATTERN_LENGTH {
        return Err(PatternError::PatternTooLong {
            rule_name: rule_name.to_string(),
            length: pattern.len(),
            max_length: constants::MAX_REGEX_PATTERN_LENGTH,
        });
    }

    Regex::new(pattern).map_err(|e| PatternError::InvalidRegex {
        rule_name: rule_name.to_string(),
        pattern: pattern.to_string(),
        source: e,
    })
}
