// LogTally - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation.
// All errors preserve the causal chain for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all LogTally operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LogTallyError {
    /// Rules configuration parsing failed.
    Config(ConfigError),

    /// An individual rule pattern failed to compile.
    Pattern(PatternError),

    /// Log analysis failed (streaming input only).
    Analyze(AnalyzeError),

    /// Export operation failed.
    Export(ExportError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for LogTallyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Pattern(e) => write!(f, "Pattern error: {e}"),
            Self::Analyze(e) => write!(f, "Analysis error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LogTallyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Pattern(e) => Some(e),
            Self::Analyze(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to parsing the rules configuration document.
///
/// These never cross the loader's public boundary: a failed parse degrades
/// to the built-in default rule set. The typed variants exist so the
/// fallback path can log exactly what went wrong.
#[derive(Debug)]
pub enum ConfigError {
    /// The document is not valid YAML.
    YamlParse { source: serde_yaml::Error },

    /// The document parsed but its top level is not a mapping of
    /// rule-name to rule-definition.
    NotAMapping,

    /// The document exceeds the maximum allowed size.
    DocTooLarge { size: usize, max_size: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::YamlParse { source } => {
                write!(f, "Failed to parse rules YAML: {source}")
            }
            Self::NotAMapping => {
                write!(f, "Rules document top level is not a mapping")
            }
            Self::DocTooLarge { size, max_size } => write!(
                f,
                "Rules document is {size} bytes, exceeds maximum of {max_size} bytes"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::YamlParse { source } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LogTallyError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Pattern errors
// ---------------------------------------------------------------------------

/// Errors related to compiling a single rule pattern.
///
/// Like `ConfigError` these are recovered locally: the offending pattern is
/// dropped and its siblings keep working. The variants are logged, never
/// propagated out of rule construction.
#[derive(Debug)]
pub enum PatternError {
    /// The pattern is not a valid regular expression.
    InvalidRegex {
        rule_name: String,
        pattern: String,
        source: regex::Error,
    },

    /// The pattern exceeds the maximum allowed length.
    PatternTooLong {
        rule_name: String,
        length: usize,
        max_length: usize,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegex {
                rule_name,
                pattern,
                source,
            } => write!(
                f,
                "Rule '{rule_name}': invalid regex '{pattern}': {source}"
            ),
            Self::PatternTooLong {
                rule_name,
                length,
                max_length,
            } => write!(
                f,
                "Rule '{rule_name}': pattern is {length} chars, \
                 exceeds maximum of {max_length}"
            ),
        }
    }
}

impl std::error::Error for PatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRegex { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<PatternError> for LogTallyError {
    fn from(e: PatternError) -> Self {
        Self::Pattern(e)
    }
}

// ---------------------------------------------------------------------------
// Analyze errors
// ---------------------------------------------------------------------------

/// Errors raised during log analysis.
///
/// Only the streaming form can fail: a broken reader mid-scan is a genuine
/// I/O fault the caller must see. Blob analysis is infallible.
#[derive(Debug)]
pub enum AnalyzeError {
    /// The log source failed while being read.
    SourceRead { source: io::Error },
}

impl fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceRead { source } => {
                write!(f, "Log source read failed: {source}")
            }
        }
    }
}

impl std::error::Error for AnalyzeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SourceRead { source } => Some(source),
        }
    }
}

impl From<AnalyzeError> for LogTallyError {
    fn from(e: AnalyzeError) -> Self {
        Self::Analyze(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export output.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for LogTallyError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

/// Convenience type alias for LogTally results.
pub type Result<T> = std::result::Result<T, LogTallyError>;
