use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use glob::glob;
use log::{LevelFilter, debug, info};
use teleinfo_core::protocol::layout;
use teleinfo_core::{
    DEFAULT_GENERATED_AT, Label, ReaderOptions, Report, compute_checksum, convert_field,
    decode_capture_file,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("TELEINFO_BUILD_COMMIT"),
    " ",
    env!("TELEINFO_BUILD_DATE"),
    ")"
);

const EXAMPLES: &str = "Examples:\n  teleinfo capture decode meter.raw -o report.json\n  teleinfo capture analyse 'captures/*.raw' --stdout --pretty\n  teleinfo checksum ISOUSC 30";

#[derive(Parser, Debug)]
#[command(name = "teleinfo")]
#[command(version = VERSION)]
#[command(
    about = "Decoder for the historic Teleinfo serial output of French electricity meters.",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on raw serial captures.
    Capture {
        #[command(subcommand)]
        command: CaptureCommands,
    },
    /// Compute the checksum character of one group line.
    Checksum {
        /// Group label, e.g. ISOUSC
        label: String,
        /// Raw value text, e.g. 30
        value: String,
    },
}

#[derive(Subcommand, Debug)]
enum CaptureCommands {
    /// Decode a capture file into a versioned JSON report.
    #[command(alias = "analyse")]
    #[command(after_help = EXAMPLES)]
    Decode(DecodeArgs),
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Path (or glob matching one file) to a .raw or .bin capture
    input: PathBuf,

    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Accept ADPS lines carrying the known firmware checksum defect
    #[arg(long)]
    auto_repair_adps: bool,

    /// Exit with a non-zero code if any frame was rejected
    #[arg(long)]
    strict: bool,

    /// List rejected frames after decoding
    #[arg(long)]
    list_errors: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let quiet = matches!(
        &cli.command,
        Commands::Capture {
            command: CaptureCommands::Decode(DecodeArgs { quiet: true, .. })
        }
    );
    init_logging(cli.verbose, quiet);

    let result = match cli.command {
        Commands::Capture { command } => match command {
            CaptureCommands::Decode(args) => cmd_capture_decode(args),
        },
        Commands::Checksum { label, value } => cmd_checksum(&label, &value),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

/// `RUST_LOG` wins over the verbosity flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, 2) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

fn cmd_capture_decode(args: DecodeArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;

    let report_path = match (args.stdout, args.report.as_ref()) {
        (true, _) => None,
        (false, Some(path)) => Some(path.as_path()),
        (false, None) => {
            return Err(CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            ));
        }
    };
    if let Some(report_path) = report_path {
        ensure_distinct_output(report_path, &input_abs)?;
    }

    let meta = fs::metadata(&resolved_input)
        .with_context(|| format!("Failed to read input file: {}", resolved_input.display()))?;
    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", args.input.display()),
            Some("use a .raw or .bin capture file".to_string()),
        ));
    }

    let options = ReaderOptions::default().with_auto_repair_adps(args.auto_repair_adps);
    debug!("decoding {} with {:?}", resolved_input.display(), options);
    let mut rep =
        decode_capture_file(&resolved_input, options).context("Teleinfo capture decoding failed")?;
    rep.generated_at = now_rfc3339();
    let json = serialize_report(&rep, args.pretty, args.compact)?;

    match report_path {
        None => print!("{}", json),
        Some(report) => {
            if let Some(parent) = report.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(report, json)
                .with_context(|| format!("Failed to write report: {}", report.display()))?;
            info!("report written to {}", report.display());
        }
    }

    if args.list_errors && !args.quiet {
        print_frame_errors(&rep);
    }
    if let Some(report) = report_path {
        if !args.quiet {
            eprintln!(
                "OK: {} frames decoded, {} rejected -> {}",
                rep.frames.len(),
                rep.errors.len(),
                report.display()
            );
        }
    }
    if args.strict && !rep.errors.is_empty() {
        return Err(CliError::new(
            format!("{} rejected frames detected", rep.errors.len()),
            Some("use --list-errors to inspect".to_string()),
        ));
    }
    Ok(())
}

fn cmd_checksum(label: &str, value: &str) -> Result<(), CliError> {
    if label.is_empty() || !label.bytes().all(|byte| byte.is_ascii_graphic()) {
        return Err(CliError::new(
            format!("invalid label '{}'", label),
            Some("labels are printable ASCII without spaces".to_string()),
        ));
    }
    if !value.is_ascii() {
        return Err(CliError::new(
            format!("invalid value '{}'", value),
            Some("values are ASCII text".to_string()),
        ));
    }

    let checksum = char::from(compute_checksum(label, value));
    let line_len = label.len() + value.len() + 3;
    if line_len > layout::MAX_LINE_LEN {
        return Err(CliError::new(
            format!("group line would be {} bytes long", line_len),
            Some(format!("lines are limited to {} bytes", layout::MAX_LINE_LEN)),
        ));
    }

    println!("checksum: {}", checksum);
    println!("line: {} {} {}", label, value, checksum);
    match convert_field(label, value) {
        Ok(Some((_, decoded))) => println!("decoded: {}", decoded),
        Ok(None) => println!("decoded: (not applicable)"),
        Err(err) => {
            if label.parse::<Label>().is_ok() {
                eprintln!("warning: {}", err);
            } else {
                eprintln!("warning: {} is not part of the historic label set", label);
            }
        }
    }
    Ok(())
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| DEFAULT_GENERATED_AT.to_string())
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    // A parent that does not exist yet cannot hold the input.
    let report_dir = report_path.parent().and_then(|parent| {
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        fs::canonicalize(parent).ok()
    });
    let Some(report_dir) = report_dir else {
        return Ok(());
    };
    let file_name = report_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path: {}", report_path.display()))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn print_frame_errors(rep: &Report) {
    eprintln!("Frame errors:");
    for error in &rep.errors {
        eprintln!(
            "  #{} {} [{}..{}]: {}",
            error.sequence, error.kind, error.span.start, error.span.end, error.message
        );
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .raw or .bin capture file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "raw" && ext != "bin" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .raw or .bin capture of the serial line".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .raw or .bin".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut message = format!(
                "multiple files match pattern '{}' ({} matches)",
                pattern, count
            );
            let listed: Vec<String> = matches
                .iter()
                .take(3)
                .map(|path| path.display().to_string())
                .collect();
            message.push_str("; matches: ");
            message.push_str(&listed.join(", "));
            if count > 3 {
                message.push_str(", ...");
            }
            Err(CliError::new(
                message,
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
