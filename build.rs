//! Build script stamping the console binary with version and commit.
//!
//! - LPR_VERSION: release tag (defaults to CARGO_PKG_VERSION)
//! - LPR_GIT_SHA: short commit (CI_COMMIT_SHA, then `git rev-parse`, then "unknown")

use std::process::Command;

fn main() {
    let version = std::env::var("LPR_VERSION")
        .or_else(|_| std::env::var("CARGO_PKG_VERSION"))
        .unwrap_or_else(|_| "unknown".into());
    println!("cargo:rustc-env=LPR_VERSION={}", version);

    let git_sha = std::env::var("LPR_GIT_SHA")
        .or_else(|_| {
            std::env::var("CI_COMMIT_SHA").map(|s| s.chars().take(7).collect::<String>())
        })
        .unwrap_or_else(|_| short_head());
    println!("cargo:rustc-env=LPR_GIT_SHA={}", git_sha);

    for var in ["LPR_VERSION", "LPR_GIT_SHA", "CI_COMMIT_SHA"] {
        println!("cargo:rerun-if-env-changed={}", var);
    }
}

fn short_head() -> String {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok();

    match output {
        Some(o) if o.status.success() => String::from_utf8(o.stdout)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "unknown".into()),
        _ => "unknown".into(),
    }
}
