// LogTally - core/export.rs
//
// Text, CSV, and JSON rendering of analysis results.
// Core layer: writes to any Write trait object; the caller owns file
// creation and path handling.

use crate::core::result::RuleMatches;
use crate::util::constants;
use crate::util::error::ExportError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Serialisable view of one rule's result, including the derived count.
#[derive(Debug, Serialize)]
struct ResultRecord<'a> {
    rule_name: &'a str,
    display_name: &'a str,
    count: usize,
    matched_lines: &'a [String],
}

impl<'a> From<&'a RuleMatches> for ResultRecord<'a> {
    fn from(result: &'a RuleMatches) -> Self {
        Self {
            rule_name: &result.rule_name,
            display_name: &result.display_name,
            count: result.count(),
            matched_lines: result.matched_lines(),
        }
    }
}

/// Complete JSON report envelope.
#[derive(Debug, Serialize)]
struct AnalysisReport<'a> {
    /// When the analysis ran (UTC).
    analyzed_at: DateTime<Utc>,
    /// Name of the analysed source ("<stdin>" for piped input).
    source: &'a str,
    rule_count: usize,
    total_matches: usize,
    results: Vec<ResultRecord<'a>>,
}

/// Sum of all per-rule counts.
pub fn total_matches(results: &[RuleMatches]) -> usize {
    results.iter().map(RuleMatches::count).sum()
}

/// Export results as a JSON report (pretty-printed object with metadata).
pub fn export_json<W: Write>(
    results: &[RuleMatches],
    source: &str,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let report = AnalysisReport {
        analyzed_at: Utc::now(),
        source,
        rule_count: results.len(),
        total_matches: total_matches(results),
        results: results.iter().map(ResultRecord::from).collect(),
    };

    serde_json::to_writer_pretty(writer, &report).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    Ok(results.len())
}

/// Export a per-rule summary as CSV: one row per rule with its count.
///
/// Writes: rule_name, display_name, count
pub fn export_csv_summary<W: Write>(
    results: &[RuleMatches],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(["rule_name", "display_name", "count"])
        .map_err(|e| ExportError::Csv {
            path: export_path.to_path_buf(),
            source: e,
        })?;

    for result in results {
        csv_writer
            .write_record([
                &result.rule_name,
                &result.display_name,
                &result.count().to_string(),
            ])
            .map_err(|e| ExportError::Csv {
                path: export_path.to_path_buf(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(results.len())
}

/// Export full match detail as CSV: one row per matched line.
///
/// Writes: rule_name, display_name, matched_line
pub fn export_csv_detail<W: Write>(
    results: &[RuleMatches],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(["rule_name", "display_name", "matched_line"])
        .map_err(|e| ExportError::Csv {
            path: export_path.to_path_buf(),
            source: e,
        })?;

    let mut rows = 0;
    for result in results {
        for line in result.matched_lines() {
            csv_writer
                .write_record([&result.rule_name, &result.display_name, line])
                .map_err(|e| ExportError::Csv {
                    path: export_path.to_path_buf(),
                    source: e,
                })?;
            rows += 1;
        }
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(rows)
}

/// Write a human-readable summary: per-rule counts and (optionally) the
/// matched lines themselves, capped per rule so a noisy rule cannot flood
/// the terminal.
pub fn write_text_summary<W: Write>(
    results: &[RuleMatches],
    source: &str,
    show_lines: bool,
    mut writer: W,
) -> std::io::Result<()> {
    writeln!(writer, "Log summary for {source}")?;
    writeln!(
        writer,
        "{} matches across {} rules",
        total_matches(results),
        results.len()
    )?;

    for result in results {
        writeln!(writer)?;
        writeln!(
            writer,
            "{} ({}): {}",
            result.display_name,
            result.rule_name,
            result.count()
        )?;

        if show_lines && result.count() > 0 {
            let cap = constants::MAX_SUMMARY_LINES_PER_RULE;
            for line in result.matched_lines().iter().take(cap) {
                writeln!(writer, "  {line}")?;
            }
            if result.count() > cap {
                writeln!(writer, "  ... {} more (use --format json)", result.count() - cap)?;
            }
        }
    }

    Ok(())
}
