// src/commands/version.rs
//! Version/release resolution

use anyhow::Result;
use rpmweave::version::VersionSpec;

/// Print the RPM version and release for a project version
pub fn cmd_version(version: &str, release: Option<&str>) -> Result<()> {
    if version.trim().is_empty() {
        anyhow::bail!("Version must not be empty");
    }
    let spec = VersionSpec::resolve(version.trim(), release);
    println!("Version: {}", spec.version);
    println!("Release: {}", spec.release);
    Ok(())
}
