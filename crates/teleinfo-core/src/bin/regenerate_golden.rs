use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use teleinfo_core::{ReaderOptions, Report, decode_capture_file};

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<(), String> {
    let root = PathBuf::from("tests").join("golden");
    let entries =
        fs::read_dir(&root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;

    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to read entry: {}", err))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let input = path.join("input.raw");
        if !input.exists() {
            continue;
        }
        let output = path.join("expected_report.json");
        regenerate_one(&input, &output)?;
    }

    Ok(())
}

/// Existing reports keep the reader options they were recorded with.
fn recorded_options(output: &Path) -> ReaderOptions {
    fs::read_to_string(output)
        .ok()
        .and_then(|json| serde_json::from_str::<Report>(&json).ok())
        .map(|report| report.options)
        .unwrap_or_default()
}

fn regenerate_one(input: &Path, output: &Path) -> Result<(), String> {
    let options = recorded_options(output);
    let report = decode_capture_file(input, options)
        .map_err(|err| format!("decoding failed for {}: {}", input.display(), err))?;
    let json = serde_json::to_string(&report)
        .map_err(|err| format!("JSON serialization failed: {}", err))?;
    fs::write(output, json)
        .map_err(|err| format!("failed to write {}: {}", output.display(), err))?;
    Ok(())
}
