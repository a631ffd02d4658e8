use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("teleinfo"))
}

fn repo_root() -> std::path::PathBuf {
    let manifest = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest
        .parent()
        .and_then(|p| p.parent())
        .expect("repo root")
        .to_path_buf()
}

fn golden_capture(case: &str) -> std::path::PathBuf {
    repo_root()
        .join("tests")
        .join("golden")
        .join(case)
        .join("input.raw")
}

fn sample_capture() -> std::path::PathBuf {
    golden_capture("cbemm_base")
}

#[test]
fn help_supports_decode_and_analyse() {
    cmd()
        .arg("capture")
        .arg("decode")
        .arg("--help")
        .assert()
        .success();
    cmd()
        .arg("capture")
        .arg("analyse")
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn version_includes_build_metadata() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")).and(contains("(")));
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.raw");
    let report = temp.path().join("report.json");

    cmd()
        .arg("capture")
        .arg("decode")
        .arg(missing)
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn unsupported_extension_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("capture.txt");
    std::fs::write(&input, b"").expect("write input");

    cmd()
        .arg("capture")
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("unsupported input format").and(contains(".raw or .bin")));
}

#[test]
fn stdout_outputs_json() {
    let input = sample_capture();
    let assert = cmd()
        .arg("capture")
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let report: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(report["report_version"], 1);
    assert_eq!(report["frames"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["frames"][0]["fields"]["ISOUSC"], 30);
    assert_eq!(report["frames"][0]["fields"]["HHPHC"], "A");
}

#[test]
fn report_file_is_written() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("nested").join("report.json");

    cmd()
        .arg("capture")
        .arg("decode")
        .arg(sample_capture())
        .arg("-o")
        .arg(&report)
        .arg("--pretty")
        .assert()
        .success()
        .stderr(contains("OK:"));

    let json = std::fs::read_to_string(&report).expect("read report");
    assert!(json.contains('\n'));
    let report: Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(report["summary"]["frames_decoded"], 2);
}

#[test]
fn glob_must_match_single_file() {
    let temp = TempDir::new().expect("tempdir");
    let capture = std::fs::read(sample_capture()).expect("read capture");
    std::fs::write(temp.path().join("a.raw"), &capture).expect("write a");

    let pattern = temp.path().join("*.raw");
    cmd()
        .arg("capture")
        .arg("decode")
        .arg(&pattern)
        .arg("--stdout")
        .assert()
        .success();

    std::fs::write(temp.path().join("b.raw"), &capture).expect("write b");
    cmd()
        .arg("capture")
        .arg("decode")
        .arg(&pattern)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("multiple files match pattern"));
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("capture")
        .arg("decode")
        .arg(sample_capture())
        .arg("--stdout")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn pretty_and_compact_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("capture")
        .arg("decode")
        .arg(sample_capture())
        .arg("-o")
        .arg(report)
        .arg("--pretty")
        .arg("--compact")
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("capture")
        .arg("decode")
        .arg(sample_capture())
        .arg("-o")
        .arg(report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn list_errors_outputs_kinds() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("capture")
        .arg("decode")
        .arg(golden_capture("damaged_stream"))
        .arg("-o")
        .arg(report)
        .arg("--list-errors")
        .assert()
        .success()
        .stderr(
            contains("Frame errors:")
                .and(contains("interrupted"))
                .and(contains("unclassifiable")),
        );
}

#[test]
fn strict_fails_when_frames_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let report = temp.path().join("report.json");

    cmd()
        .arg("capture")
        .arg("decode")
        .arg(golden_capture("damaged_stream"))
        .arg("-o")
        .arg(report)
        .arg("--strict")
        .assert()
        .failure()
        .stderr(contains("rejected frames detected"));
}

#[test]
fn strict_passes_on_clean_capture() {
    cmd()
        .arg("capture")
        .arg("decode")
        .arg(sample_capture())
        .arg("--stdout")
        .arg("--strict")
        .assert()
        .success();
}

#[test]
fn auto_repair_flag_reaches_reader() {
    let assert = cmd()
        .arg("capture")
        .arg("decode")
        .arg(golden_capture("adps_auto_repair"))
        .arg("--stdout")
        .arg("--auto-repair-adps")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let report: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(report["options"]["auto_repair_adps"], true);
    assert_eq!(report["frames"][0]["fields"]["ADPS"], 37);

    let assert = cmd()
        .arg("capture")
        .arg("decode")
        .arg(golden_capture("adps_auto_repair"))
        .arg("--stdout")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let report: Value = serde_json::from_str(&stdout).expect("valid json");
    assert!(report["frames"][0]["fields"].get("ADPS").is_none());
}

#[test]
fn checksum_prints_character_and_line() {
    cmd()
        .arg("checksum")
        .arg("ISOUSC")
        .arg("30")
        .assert()
        .success()
        .stdout(
            contains("checksum: 9")
                .and(contains("line: ISOUSC 30 9"))
                .and(contains("decoded: 30")),
        );
}

#[test]
fn checksum_warns_on_unknown_label() {
    cmd()
        .arg("checksum")
        .arg("FOO")
        .arg("12")
        .assert()
        .success()
        .stderr(contains("not part of the historic label set"));
}

#[test]
fn checksum_rejects_label_with_space() {
    cmd()
        .arg("checksum")
        .arg("BAD LABEL")
        .arg("1")
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}
