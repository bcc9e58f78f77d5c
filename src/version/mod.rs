// src/version/mod.rs

//! Version handling for package headers and dependency patterns
//!
//! Two concerns live here:
//! - normalizing a project version (which may carry a `-qualifier`) into the
//!   RPM `Version`/`Release` pair, since RPM forbids dashes in `Version`
//! - comparing artifact versions against the ranges used in dependency
//!   coordinate patterns

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;
use tracing::warn;

/// Release used when neither an explicit release nor a qualifier is present
pub const DEFAULT_RELEASE: &str = "1";

/// Qualifier suffix that triggers a timestamped release
const SNAPSHOT_SUFFIX: &str = "SNAPSHOT";

/// The resolved `Version` and `Release` header values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpec {
    pub version: String,
    pub release: String,
}

impl VersionSpec {
    /// Resolve a raw project version, using the current UTC time for snapshots
    pub fn resolve(raw: &str, release: Option<&str>) -> Self {
        Self::resolve_at(raw, release, Utc::now())
    }

    /// Resolve a raw project version against a fixed clock
    ///
    /// - "1.2.3" → ("1.2.3", "1")
    /// - "1.2.3-rc-1" → ("1.2.3", "rc_1_1")
    /// - "1.2.3-SNAPSHOT" → ("1.2.3", "SNAPSHOT20240101120000")
    ///
    /// An explicit release is always used unchanged.
    pub fn resolve_at(raw: &str, release: Option<&str>, now: DateTime<Utc>) -> Self {
        let Some(dash) = raw.find('-') else {
            return Self {
                version: raw.to_string(),
                release: release.unwrap_or(DEFAULT_RELEASE).to_string(),
            };
        };

        let version = raw[..dash].to_string();
        warn!(
            "Version string '{}' contains '-', truncating to '{}'",
            raw, version
        );

        let release = match release {
            Some(explicit) => explicit.to_string(),
            None => {
                let mut modifier = raw[dash + 1..].replace('-', "_");
                if modifier.ends_with(SNAPSHOT_SUFFIX) {
                    modifier.push_str(&now.format("%Y%m%d%H%M%S").to_string());
                } else {
                    modifier.push_str("_1");
                }
                modifier
            }
        };

        Self { version, release }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.version, self.release)
    }
}

/// A version attached to a build artifact
///
/// Artifact versions are rarely semver ("1.0", "2.3.4.5", "5.3.20.RELEASE",
/// "1.0-SNAPSHOT"). They are compared token by token: numeric tokens as
/// numbers, qualifiers by [`qualifier_rank`]. Trailing zeros and release
/// qualifiers carry no weight, so "2.0", "2.0.0" and "2.0.Final" are equal.
#[derive(Debug, Clone)]
pub struct ArtifactVersion {
    raw: String,
}

/// One `.`/`-` separated piece of a version
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(u64),
    Qualifier(String),
}

/// Rank of the release itself; qualifiers below it sort before the release
const RELEASE_RANK: u8 = 5;

/// Ordering of well-known qualifiers
///
/// alpha < beta < milestone < rc < snapshot < release (ga, final) < sp <
/// anything unknown
fn qualifier_rank(qualifier: &str) -> u8 {
    match qualifier {
        "alpha" | "a" => 0,
        "beta" | "b" => 1,
        "milestone" | "m" => 2,
        "rc" | "cr" => 3,
        "snapshot" => 4,
        "" | "ga" | "final" | "release" => RELEASE_RANK,
        "sp" => 6,
        _ => 7,
    }
}

impl Token {
    fn is_padding(&self) -> bool {
        match self {
            Token::Number(n) => *n == 0,
            Token::Qualifier(q) => qualifier_rank(q) == RELEASE_RANK,
        }
    }

    fn cmp_token(&self, other: &Token) -> Ordering {
        match (self, other) {
            (Token::Number(a), Token::Number(b)) => a.cmp(b),
            (Token::Number(_), Token::Qualifier(_)) => Ordering::Greater,
            (Token::Qualifier(_), Token::Number(_)) => Ordering::Less,
            (Token::Qualifier(a), Token::Qualifier(b)) => qualifier_rank(a)
                .cmp(&qualifier_rank(b))
                .then_with(|| a.cmp(b)),
        }
    }

    /// Compare against a missing token on the shorter side
    fn cmp_missing(&self) -> Ordering {
        match self {
            Token::Number(n) => n.cmp(&0),
            Token::Qualifier(q) => qualifier_rank(q).cmp(&RELEASE_RANK),
        }
    }
}

impl ArtifactVersion {
    /// Parse an artifact version; only empty strings are rejected
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::ConfigError("Empty version".to_string()));
        }
        Ok(Self { raw: s.to_string() })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Split into tokens, breaking at `.`, `-`, `_` and digit/letter changes
    ///
    /// "5.3.20.RELEASE" → [5, 3, 20], "1.0-rc1" → [1, "rc", 1]
    fn tokens(&self) -> Vec<Token> {
        let mut tokens = Vec::new();
        for piece in self.raw.to_ascii_lowercase().split(['.', '-', '_']) {
            let mut rest = piece;
            while !rest.is_empty() {
                let numeric = rest.starts_with(|c: char| c.is_ascii_digit());
                let end = rest
                    .find(|c: char| c.is_ascii_digit() != numeric)
                    .unwrap_or(rest.len());
                let (head, tail) = rest.split_at(end);
                tokens.push(match head.parse::<u64>() {
                    Ok(n) if numeric => Token::Number(n),
                    _ => Token::Qualifier(head.to_string()),
                });
                rest = tail;
            }
        }

        while tokens.last().is_some_and(Token::is_padding) {
            tokens.pop();
        }
        tokens
    }
}

impl PartialEq for ArtifactVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ArtifactVersion {}

impl Ord for ArtifactVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = self.tokens();
        let right = other.tokens();
        for i in 0..left.len().max(right.len()) {
            let ordering = match (left.get(i), right.get(i)) {
                (Some(a), Some(b)) => a.cmp_token(b),
                (Some(a), None) => a.cmp_missing(),
                (None, Some(b)) => b.cmp_missing().reverse(),
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for ArtifactVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ArtifactVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A version range used by dependency patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRange {
    /// Any resolved version
    Any,
    Exact(ArtifactVersion),
    GreaterThan(ArtifactVersion),
    GreaterOrEqual(ArtifactVersion),
    LessThan(ArtifactVersion),
    LessOrEqual(ArtifactVersion),
    NotEqual(ArtifactVersion),
    /// Both ranges must contain the version (for "[1.0,2.0)" or ">= 1.0, < 2.0")
    And(Box<VersionRange>, Box<VersionRange>),
    /// Either range may contain the version (for "[1.0,1.5],[2.0,)")
    Or(Box<VersionRange>, Box<VersionRange>),
}

impl VersionRange {
    /// Parse a version range
    ///
    /// Accepted forms:
    /// - "" or "*" → any version
    /// - "[1.0,2.0)", "[1.0,)", "(,2.0]", "[1.5]" → bracket ranges, optionally
    ///   several joined by commas
    /// - ">= 1.0", "< 2.0", ">= 1.0, < 2.0" → operator constraints
    /// - "1.5" → exactly that version
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "*" {
            return Ok(VersionRange::Any);
        }

        if s.starts_with('[') || s.starts_with('(') {
            return Self::parse_brackets(s);
        }

        if s.contains(',') {
            let parts: Vec<&str> = s.split(',').map(|p| p.trim()).collect();
            if parts.len() == 2 {
                let left = Self::parse(parts[0])?;
                let right = Self::parse(parts[1])?;
                return Ok(VersionRange::And(Box::new(left), Box::new(right)));
            }
            return Err(Error::ConfigError(format!("Invalid version range '{}'", s)));
        }

        if let Some(rest) = s.strip_prefix(">=") {
            Ok(VersionRange::GreaterOrEqual(ArtifactVersion::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix("<=") {
            Ok(VersionRange::LessOrEqual(ArtifactVersion::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix("!=") {
            Ok(VersionRange::NotEqual(ArtifactVersion::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix('>') {
            Ok(VersionRange::GreaterThan(ArtifactVersion::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix('<') {
            Ok(VersionRange::LessThan(ArtifactVersion::parse(rest)?))
        } else if let Some(rest) = s.strip_prefix('=') {
            Ok(VersionRange::Exact(ArtifactVersion::parse(rest)?))
        } else {
            Ok(VersionRange::Exact(ArtifactVersion::parse(s)?))
        }
    }

    /// Parse one or more bracket ranges separated by commas
    fn parse_brackets(s: &str) -> Result<Self> {
        let invalid = || Error::ConfigError(format!("Invalid version range '{}'", s));

        let mut ranges = Vec::new();
        let mut rest = s;
        while !rest.is_empty() {
            let close = rest.find([']', ')']).ok_or_else(invalid)?;
            ranges.push(Self::parse_single_bracket(&rest[..=close]).ok_or_else(invalid)??);
            rest = rest[close + 1..].trim_start();
            if let Some(next) = rest.strip_prefix(',') {
                rest = next.trim_start();
                if rest.is_empty() {
                    return Err(invalid());
                }
            } else if !rest.is_empty() {
                return Err(invalid());
            }
        }

        let mut iter = ranges.into_iter();
        let first = iter.next().ok_or_else(invalid)?;
        Ok(iter.fold(first, |acc, r| VersionRange::Or(Box::new(acc), Box::new(r))))
    }

    /// Parse "[a,b)" style text; returns None when the brackets are malformed
    fn parse_single_bracket(s: &str) -> Option<Result<Self>> {
        let open = s.chars().next()?;
        let close = s.chars().last()?;
        if !matches!(open, '[' | '(') || !matches!(close, ']' | ')') || s.len() < 2 {
            return None;
        }
        let inner = &s[1..s.len() - 1];

        let Some((low, high)) = inner.split_once(',') else {
            // "[1.5]" pins a single version
            if open != '[' || close != ']' {
                return None;
            }
            return Some(ArtifactVersion::parse(inner).map(VersionRange::Exact));
        };

        Some(Self::bounded(low, open == '[', high, close == ']'))
    }

    fn bounded(low: &str, low_inclusive: bool, high: &str, high_inclusive: bool) -> Result<Self> {
        let lower = match low.trim() {
            "" => None,
            text => {
                let v = ArtifactVersion::parse(text)?;
                Some(if low_inclusive {
                    VersionRange::GreaterOrEqual(v)
                } else {
                    VersionRange::GreaterThan(v)
                })
            }
        };
        let upper = match high.trim() {
            "" => None,
            text => {
                let v = ArtifactVersion::parse(text)?;
                Some(if high_inclusive {
                    VersionRange::LessOrEqual(v)
                } else {
                    VersionRange::LessThan(v)
                })
            }
        };

        Ok(match (lower, upper) {
            (Some(l), Some(u)) => VersionRange::And(Box::new(l), Box::new(u)),
            (Some(l), None) => l,
            (None, Some(u)) => u,
            (None, None) => VersionRange::Any,
        })
    }

    /// Check whether a version lies inside this range
    pub fn contains(&self, version: &ArtifactVersion) -> bool {
        match self {
            VersionRange::Any => true,
            VersionRange::Exact(v) => version == v,
            VersionRange::GreaterThan(v) => version > v,
            VersionRange::GreaterOrEqual(v) => version >= v,
            VersionRange::LessThan(v) => version < v,
            VersionRange::LessOrEqual(v) => version <= v,
            VersionRange::NotEqual(v) => version != v,
            VersionRange::And(left, right) => left.contains(version) && right.contains(version),
            VersionRange::Or(left, right) => left.contains(version) || right.contains(version),
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRange::Any => write!(f, "*"),
            VersionRange::Exact(v) => write!(f, "= {}", v),
            VersionRange::GreaterThan(v) => write!(f, "> {}", v),
            VersionRange::GreaterOrEqual(v) => write!(f, ">= {}", v),
            VersionRange::LessThan(v) => write!(f, "< {}", v),
            VersionRange::LessOrEqual(v) => write!(f, "<= {}", v),
            VersionRange::NotEqual(v) => write!(f, "!= {}", v),
            VersionRange::And(left, right) => write!(f, "{}, {}", left, right),
            VersionRange::Or(left, right) => write!(f, "{} || {}", left, right),
        }
    }
}
