// LogTally - core/rules.rs
//
// Rule-set loading from a YAML configuration document, with fallback to a
// built-in default set. Core layer: accepts document strings, never
// touches the filesystem.
//
// Failure policy: this loader never returns an error. A malformed
// document, a non-mapping top level, or an oversized document all degrade
// to the default rule set; individual bad entries are dropped and the
// rest of the document keeps working.

use crate::core::analyzer::Analyzer;
use crate::core::rule::Rule;
use crate::util::constants;
use crate::util::error::ConfigError;
use serde::Deserialize;

// =============================================================================
// YAML deserialization structures (raw input)
// =============================================================================

/// Raw rule definition as deserialized from one entry of the rules
/// mapping. Validated and compiled into a `Rule` for runtime use.
///
/// Document shape:
/// ```yaml
/// error:
///   search:
///     - "/(?i)error/"
///     - "/fatal/"
///   showName: Error
/// warning:
///   search: "/(?i)warning/"
/// ```
#[derive(Debug, Deserialize)]
pub struct RuleDefinition {
    /// Pattern or patterns to search for. Absent means the entry is
    /// dropped (a rule with nothing to match is useless).
    #[serde(default)]
    pub search: Option<SearchPatterns>,

    /// Human display label; defaults to the rule's key name.
    #[serde(default, rename = "showName")]
    pub show_name: Option<String>,
}

/// `search` accepts either a single pattern string or a sequence of
/// pattern strings; both normalise to a sequence.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SearchPatterns {
    One(String),
    Many(Vec<String>),
}

impl SearchPatterns {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(pattern) => vec![pattern],
            Self::Many(patterns) => patterns,
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Build an `Analyzer` from a rules configuration document.
///
/// `None` or a blank document yields the built-in default rules. Any parse
/// failure of the whole document is treated identically — this function
/// never fails, worst case is "fewer rules matched than intended".
pub fn analyzer_from_config(doc: Option<&str>) -> Analyzer {
    let Some(doc) = doc else {
        return Analyzer::new(default_rules());
    };
    if doc.trim().is_empty() {
        return Analyzer::new(default_rules());
    }

    match parse_rules(doc) {
        Ok(rules) => {
            tracing::debug!(rules = rules.len(), "Rules loaded from configuration");
            Analyzer::new(rules)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Rules configuration unusable; using default rules");
            Analyzer::new(default_rules())
        }
    }
}

/// Strict parse of a rules document into compiled rules.
///
/// Whole-document failures surface as `ConfigError` so the caller can log
/// them before falling back; per-entry failures are dropped silently here.
fn parse_rules(doc: &str) -> Result<Vec<Rule>, ConfigError> {
    if doc.len() > constants::MAX_RULES_DOC_SIZE {
        return Err(ConfigError::DocTooLarge {
            size: doc.len(),
            max_size: constants::MAX_RULES_DOC_SIZE,
        });
    }

    let value: serde_yaml::Value =
        serde_yaml::from_str(doc).map_err(|e| ConfigError::YamlParse { source: e })?;

    let serde_yaml::Value::Mapping(mapping) = value else {
        return Err(ConfigError::NotAMapping);
    };

    let mut rules = Vec::new();

    for (key, entry) in mapping {
        // Non-string keys cannot name a rule; skip them like any other
        // malformed entry.
        let Some(name) = key.as_str().map(str::to_owned) else {
            tracing::warn!("Skipping rule entry with non-string key");
            continue;
        };

        if rules.len() >= constants::MAX_RULES {
            tracing::warn!(
                max = constants::MAX_RULES,
                "Rule limit reached; dropping remaining entries"
            );
            break;
        }

        // Entries whose value is not a rule-definition mapping are dropped,
        // not an error.
        let definition: RuleDefinition = match serde_yaml::from_value(entry) {
            Ok(def) => def,
            Err(e) => {
                tracing::warn!(rule = %name, error = %e, "Skipping malformed rule entry");
                continue;
            }
        };

        let patterns = definition
            .search
            .map(SearchPatterns::into_vec)
            .unwrap_or_default();
        if patterns.is_empty() {
            tracing::warn!(rule = %name, "Skipping rule with no search patterns");
            continue;
        }

        let show_name = definition.show_name.unwrap_or_else(|| name.clone());
        rules.push(Rule::with_patterns(name, show_name, patterns));
    }

    Ok(rules)
}

// =============================================================================
// Built-in default rules
// =============================================================================

/// The fallback rule set used when no usable configuration is available:
/// error/warning/info with curated build-log patterns.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::with_patterns(
            "error",
            "Error",
            vec![
                "/(?i)^error /".to_string(),
                "/(?i)error:/".to_string(),
                "/(?i)fatal error/".to_string(),
                "/(?i)build failed/".to_string(),
                "/(?i)compilation failed/".to_string(),
            ],
        ),
        Rule::with_patterns(
            "warning",
            "Warning",
            vec![
                "/[Ww]arning/".to_string(),
                "/WARNING/".to_string(),
                "/(?i)warning:/".to_string(),
                "/(?i)deprecated/".to_string(),
            ],
        ),
        Rule::with_patterns(
            "info",
            "Information",
            vec![
                "/(?i)^info /".to_string(),
                "/(?i)information:/".to_string(),
                "/(?i)note:/".to_string(),
            ],
        ),
    ]
}
