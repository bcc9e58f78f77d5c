// src/select/platform.rs

//! Target architecture / OS applicability of sources

use crate::error::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::fmt;

/// Architecture sentinel for architecture-independent packages
pub const NOARCH: &str = "noarch";

/// The architecture and OS a package is built for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPlatform {
    pub arch: String,
    pub os: String,
}

impl TargetPlatform {
    pub fn new(arch: &str, os: &str) -> Self {
        Self {
            arch: arch.to_string(),
            os: os.to_string(),
        }
    }

    /// The platform of the running host, in RPM naming
    pub fn host() -> Self {
        Self::new(host_arch(), "linux")
    }
}

/// Host architecture using RPM's names
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86" => "i386",
        "powerpc64" => "ppc64",
        "powerpc" => "ppc",
        other => other,
    }
}

/// A regular expression that must match a whole platform string
///
/// Compiled once when the descriptor is read; keeps its source text for
/// messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct PlatformFilter {
    source: String,
    regex: Regex,
}

impl PlatformFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            Error::ConfigError(format!("Invalid platform pattern '{}': {}", pattern, e))
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl TryFrom<String> for PlatformFilter {
    type Error = Error;

    fn try_from(pattern: String) -> Result<Self> {
        Self::new(&pattern)
    }
}

impl PartialEq for PlatformFilter {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for PlatformFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Whether optional architecture and OS filters admit a platform
///
/// The architecture is compared lower-cased, the OS as given.
pub fn platform_matches(
    arch_filter: Option<&PlatformFilter>,
    os_filter: Option<&PlatformFilter>,
    target: &TargetPlatform,
) -> bool {
    let arch_ok = arch_filter.is_none_or(|f| f.is_match(&target.arch.to_lowercase()));
    let os_ok = os_filter.is_none_or(|f| f.is_match(&target.os));
    arch_ok && os_ok
}
