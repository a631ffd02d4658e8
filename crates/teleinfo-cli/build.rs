//! Stamps `teleinfo --version` with the source revision and its date.

use std::env;
use std::process::Command;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const UNKNOWN: &str = "unknown";

struct Stamp {
    commit: String,
    date: String,
}

impl Stamp {
    fn collect() -> Self {
        let commit = git(&["rev-parse", "--short=7", "HEAD"]).unwrap_or_else(|| UNKNOWN.into());
        // Reproducible builds pin the date; otherwise use the last commit,
        // then the build time for source tarballs.
        let date = pinned_date()
            .or_else(|| git(&["log", "-1", "--format=%cI"]))
            .or_else(|| rfc3339(OffsetDateTime::now_utc()))
            .unwrap_or_else(|| UNKNOWN.into());
        Stamp { commit, date }
    }

    fn emit(&self) {
        println!("cargo:rustc-env=TELEINFO_BUILD_COMMIT={}", self.commit);
        println!("cargo:rustc-env=TELEINFO_BUILD_DATE={}", self.date);
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    Stamp::collect().emit();
}

fn pinned_date() -> Option<String> {
    let seconds = env::var("SOURCE_DATE_EPOCH").ok()?.trim().parse::<i64>().ok()?;
    rfc3339(OffsetDateTime::from_unix_timestamp(seconds).ok()?)
}

fn rfc3339(at: OffsetDateTime) -> Option<String> {
    at.format(&Rfc3339).ok()
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (output.status.success() && !text.is_empty()).then(|| text.to_string())
}
