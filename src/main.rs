// LogTally - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. Logging initialisation (debug mode support)
// 3. Rules configuration loading (file or built-in defaults)
// 4. Log acquisition (file, mmap for large files, or stdin stream)
// 5. Report rendering (text, JSON, CSV)

use clap::{Parser, ValueEnum};
use logtally::core::analyzer::{Analyzer, ExecutionMode};
use logtally::core::result::RuleMatches;
use logtally::core::{export, rules};
use logtally::util::error::{LogTallyError, Result};
use logtally::util::{constants, logging};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retry limits for transient I/O errors while reading the log file.
const MAX_RETRIES: u32 = 3;
const RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

/// Output format for the analysis report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable per-rule summary.
    Text,
    /// Full JSON report with matched lines and metadata.
    Json,
    /// CSV summary: one row per rule with its count.
    Csv,
    /// CSV detail: one row per matched line.
    CsvDetail,
}

/// LogTally - rule-based build log classification.
///
/// Point LogTally at a build log (or pipe one in) and a YAML rules file to
/// get per-rule match counts and the matching lines.
#[derive(Parser, Debug)]
#[command(name = "logtally", version, about)]
struct Cli {
    /// Log file to analyse ("-" or omitted reads stdin).
    log: Option<PathBuf>,

    /// YAML rules file. Omitted or unreadable: built-in default rules.
    #[arg(short = 'r', long = "rules")]
    rules: Option<PathBuf>,

    /// Report format.
    #[arg(short = 'f', long = "format", value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write the report to a file instead of stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Stream the log incrementally instead of loading it into memory.
    #[arg(long = "stream")]
    stream: bool,

    /// Force single-threaded scanning (deterministic matched-line order).
    #[arg(long = "sequential", conflicts_with = "parallel")]
    sequential: bool,

    /// Force parallel scanning.
    #[arg(long = "parallel", conflicts_with = "sequential")]
    parallel: bool,

    /// Include matched lines in the text summary.
    #[arg(short = 'l', long = "lines")]
    lines: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    logging::init(cli.debug);

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "LogTally starting"
    );

    if let Err(e) = run(&cli) {
        tracing::error!(error = %e, "Analysis failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Load the rules configuration. A missing or unreadable rules file is
    // the same as no configuration: warn and fall back to the defaults.
    // Only the loader ever sees the document text.
    let rules_doc = match &cli.rules {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(
                    file = %path.display(),
                    error = %e,
                    "Cannot read rules file; using default rules"
                );
                None
            }
        },
        None => None,
    };

    let analyzer = rules::analyzer_from_config(rules_doc.as_deref());
    tracing::info!(rules = analyzer.rule_count(), "Analyzer ready");

    // Acquire the log and analyse it.
    let (results, source_name) = match &cli.log {
        Some(path) if path.as_os_str() != "-" => analyze_file(cli, &analyzer, path)?,
        _ => analyze_stdin(cli, &analyzer)?,
    };

    tracing::info!(
        rules = results.len(),
        matches = export::total_matches(&results),
        "Analysis complete"
    );

    render(cli, &results, &source_name)
}

// =============================================================================
// Analysis dispatch
// =============================================================================

/// Analyse a log file, picking streaming vs in-memory and sequential vs
/// parallel from the CLI flags and the size/rule-count policy.
fn analyze_file(cli: &Cli, analyzer: &Analyzer, path: &Path) -> Result<(Vec<RuleMatches>, String)> {
    let metadata = std::fs::metadata(path).map_err(|e| LogTallyError::Io {
        path: path.to_path_buf(),
        operation: "stat",
        source: e,
    })?;

    let mode = resolve_mode(cli, metadata.len(), analyzer.rule_count());
    let source_name = path.display().to_string();

    tracing::debug!(
        file = %source_name,
        bytes = metadata.len(),
        ?mode,
        stream = cli.stream,
        "Scanning log file"
    );

    let results = if cli.stream {
        let file = std::fs::File::open(path).map_err(|e| LogTallyError::Io {
            path: path.to_path_buf(),
            operation: "open",
            source: e,
        })?;
        let reader = BufReader::new(file);
        match mode {
            ExecutionMode::Sequential => analyzer.analyze_reader(reader)?,
            ExecutionMode::Parallel => analyzer.analyze_reader_parallel(reader)?,
        }
    } else {
        let content = read_log_content(path, metadata.len())?;
        analyzer.analyze_with(Some(&content), mode)
    };

    Ok((results, source_name))
}

/// Analyse stdin as a stream. Input size is unknown up front, so the
/// parallel choice comes from the rule count (or an explicit flag).
fn analyze_stdin(cli: &Cli, analyzer: &Analyzer) -> Result<(Vec<RuleMatches>, String)> {
    let mode = resolve_mode(cli, 0, analyzer.rule_count());
    let stdin = io::stdin();

    let results = match mode {
        ExecutionMode::Sequential => analyzer.analyze_reader(stdin.lock())?,
        ExecutionMode::Parallel => analyzer.analyze_reader_parallel(stdin.lock())?,
    };

    Ok((results, "<stdin>".to_string()))
}

/// Explicit CLI flags win; otherwise defer to the execution-mode policy.
fn resolve_mode(cli: &Cli, input_bytes: u64, rule_count: usize) -> ExecutionMode {
    if cli.sequential {
        ExecutionMode::Sequential
    } else if cli.parallel {
        ExecutionMode::Parallel
    } else {
        ExecutionMode::choose(input_bytes, rule_count)
    }
}

// =============================================================================
// File reading
// =============================================================================

/// Read the full content of a log file as a UTF-8 string.
///
/// Large files use `memmap2`, which avoids copying the file into heap
/// memory before the UTF-8 check. Small files use `fs::read_to_string`
/// with transient-error retries (WouldBlock, Interrupted, TimedOut).
fn read_log_content(path: &Path, len: u64) -> Result<String> {
    if len >= constants::LARGE_FILE_THRESHOLD {
        read_large_file(path)
    } else {
        read_small_file_with_retry(path)
    }
}

fn read_large_file(path: &Path) -> Result<String> {
    let io_err = |operation: &'static str, source: io::Error| LogTallyError::Io {
        path: path.to_path_buf(),
        operation,
        source,
    };

    let file = std::fs::File::open(path).map_err(|e| io_err("open", e))?;
    // SAFETY: the file is read-only and we do not mutate the map. External
    // modification during the map's lifetime could produce undefined
    // behaviour; acceptable for a tool reading already-written build logs.
    let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(|e| io_err("mmap", e))?;
    std::str::from_utf8(&mmap)
        .map(|s| s.to_string())
        .map_err(|e| io_err("decode", io::Error::new(io::ErrorKind::InvalidData, e)))
}

fn read_small_file_with_retry(path: &Path) -> Result<String> {
    let mut last_err: Option<io::Error> = None;

    for attempt in 0..MAX_RETRIES {
        match std::fs::read_to_string(path) {
            Ok(content) => return Ok(content),
            Err(e) if is_transient_error(&e) => {
                tracing::debug!(
                    file = %path.display(),
                    attempt = attempt + 1,
                    error = %e,
                    "Transient I/O error, retrying"
                );
                std::thread::sleep(Duration::from_millis(RETRY_DELAYS_MS[attempt as usize]));
                last_err = Some(e);
            }
            Err(e) => {
                return Err(LogTallyError::Io {
                    path: path.to_path_buf(),
                    operation: "read",
                    source: e,
                })
            }
        }
    }

    Err(LogTallyError::Io {
        path: path.to_path_buf(),
        operation: "read",
        source: last_err.unwrap_or_else(|| io::Error::other("Unknown read error")),
    })
}

/// Returns true for transient I/O errors that are worth retrying.
fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}

// =============================================================================
// Report rendering
// =============================================================================

fn render(cli: &Cli, results: &[RuleMatches], source_name: &str) -> Result<()> {
    // Resolve the output sink: a file when --output was given, else stdout.
    let report_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from("<stdout>"));

    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(std::fs::File::create(path).map_err(|e| LogTallyError::Io {
            path: path.clone(),
            operation: "create",
            source: e,
        })?),
        None => Box::new(io::stdout().lock()),
    };

    match cli.format {
        OutputFormat::Text => {
            export::write_text_summary(results, source_name, cli.lines, &mut writer).map_err(
                |e| LogTallyError::Io {
                    path: report_path.clone(),
                    operation: "write",
                    source: e,
                },
            )?;
        }
        OutputFormat::Json => {
            export::export_json(results, source_name, &mut writer, &report_path)?;
        }
        OutputFormat::Csv => {
            export::export_csv_summary(results, &mut writer, &report_path)?;
        }
        OutputFormat::CsvDetail => {
            export::export_csv_detail(results, &mut writer, &report_path)?;
        }
    }

    writer.flush().map_err(|e| LogTallyError::Io {
        path: report_path,
        operation: "flush",
        source: e,
    })?;

    Ok(())
}
