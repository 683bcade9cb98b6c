// LogTally - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "LogTally";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Rule limits
// =============================================================================

/// Maximum regex pattern length to prevent ReDoS.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4_096;

/// Maximum size of a rules configuration document in bytes.
/// Documents larger than this are rejected and the default rule set is used.
pub const MAX_RULES_DOC_SIZE: usize = 256 * 1024; // 256 KB

/// Maximum number of rules accepted from a single configuration document.
/// Entries beyond this are dropped with a warning.
pub const MAX_RULES: usize = 200;

// =============================================================================
// Analysis limits
// =============================================================================

/// Input size in bytes above which the execution-mode policy selects
/// parallel scanning. Below this the per-line work is too small for the
/// fan-out overhead to pay off.
pub const PARALLEL_MIN_INPUT_BYTES: u64 = 1_000_000; // ~1 MB

/// Rule count above which the execution-mode policy selects parallel
/// scanning regardless of input size (per-line cost scales with rules).
pub const PARALLEL_MIN_RULES: usize = 5;

/// File size threshold in bytes above which log files are read via mmap
/// instead of a buffered heap read.
pub const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024; // 100 MB

// =============================================================================
// Output limits
// =============================================================================

/// Maximum number of matched lines echoed per rule in the text summary.
/// The full set is always available via JSON/CSV export.
pub const MAX_SUMMARY_LINES_PER_RULE: usize = 20;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
