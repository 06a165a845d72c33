//! Stamps build metadata into the `conduit` binary

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn main() {
    let built = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    println!("cargo:rustc-env=CONDUIT_BUILT_AT={built}");

    if let Some(revision) = git(&["describe", "--always", "--dirty", "--abbrev=10"]) {
        println!("cargo:rustc-env=CONDUIT_GIT_REVISION={revision}");
    }

    if let Ok(target) = std::env::var("TARGET") {
        println!("cargo:rustc-env=CONDUIT_TARGET={target}");
    }
    if let Ok(profile) = std::env::var("PROFILE") {
        println!("cargo:rustc-env=CONDUIT_PROFILE={profile}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
}
