// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=WEBCAM_WIZARD_VERSION");

    // Packagers without a git checkout pass the version in
    let version = std::env::var("WEBCAM_WIZARD_VERSION").unwrap_or_else(|_| describe_version());
    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Version string derived from the nearest `v*` tag
///
/// - exact tag `v0.2.0` becomes `0.2.0-<hash>`
/// - `v0.2.0-5-gabcdef1` becomes `0.2.0-dirty-abcdef1`
/// - no tag at all falls back to the package version plus hash
fn describe_version() -> String {
    let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string());

    let Some(described) = git(&["describe", "--tags", "--match", "v*"]) else {
        return format!("{}-{}", env!("CARGO_PKG_VERSION"), hash);
    };
    let described = described.strip_prefix('v').unwrap_or(&described);

    let parts: Vec<&str> = described.rsplitn(3, '-').collect();
    match parts.as_slice() {
        [commit, _ahead, base] => {
            let commit = commit.strip_prefix('g').unwrap_or(commit);
            format!("{}-dirty-{}", base, commit)
        }
        _ => format!("{}-{}", described, hash),
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
