// src/select/dependency.rs

//! Dependency artifact selection by coordinate pattern
//!
//! Patterns take the form `group:artifact[:version[:type[:classifier]]]`.
//! Every segment defaults to "match anything"; `*` does the same explicitly.
//! The version segment is a range (see [`VersionRange`]).

use crate::error::{Error, Result};
use crate::select::artifact::Artifact;
use crate::version::{ArtifactVersion, VersionRange};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// A parsed dependency coordinate pattern
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct CoordinatePattern {
    raw: String,
    group: String,
    artifact: String,
    version: VersionRange,
    kind: Option<String>,
    classifier: Option<String>,
}

impl CoordinatePattern {
    pub fn parse(s: &str) -> Result<Self> {
        let raw = s.trim();
        let segments: Vec<&str> = raw.split(':').map(str::trim).collect();
        if raw.is_empty() || segments.len() < 2 || segments.len() > 5 {
            return Err(Error::ConfigError(format!(
                "Invalid dependency coordinate '{}': expected group:artifact[:version[:type[:classifier]]]",
                s
            )));
        }

        let optional = |idx: usize| {
            segments
                .get(idx)
                .filter(|seg| !seg.is_empty() && **seg != "*")
                .map(|seg| seg.to_string())
        };

        let version = match segments.get(2) {
            Some(range) => VersionRange::parse(range).map_err(|e| {
                Error::ConfigError(format!("Invalid dependency coordinate '{}': {}", s, e))
            })?,
            None => VersionRange::Any,
        };

        Ok(Self {
            raw: raw.to_string(),
            group: segments[0].to_string(),
            artifact: segments[1].to_string(),
            version,
            kind: optional(3),
            classifier: optional(4),
        })
    }

    /// Whether a candidate artifact matches this pattern
    ///
    /// A candidate without a resolved version never matches.
    pub fn matches(&self, candidate: &Artifact) -> bool {
        if !segment_matches(&self.group, &candidate.group)
            || !segment_matches(&self.artifact, &candidate.artifact)
        {
            return false;
        }

        let Some(version) = candidate
            .version
            .as_deref()
            .and_then(|v| ArtifactVersion::parse(v).ok())
        else {
            return false;
        };
        if !self.version.contains(&version) {
            return false;
        }

        if let Some(kind) = &self.kind {
            if kind != &candidate.kind {
                return false;
            }
        }
        if let Some(classifier) = &self.classifier {
            if classifier != candidate.classifier_or_empty() {
                return false;
            }
        }
        true
    }
}

fn segment_matches(pattern: &str, value: &str) -> bool {
    pattern.is_empty() || pattern == "*" || pattern == value
}

impl FromStr for CoordinatePattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CoordinatePattern {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl fmt::Display for CoordinatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Which dependency artifacts a mapping receives
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DependencySelector {
    /// `None` admits every candidate not excluded
    pub includes: Option<Vec<CoordinatePattern>>,
    pub excludes: Vec<CoordinatePattern>,
    /// Name copies `artifact[-classifier].type` instead of the file's own name
    pub strip_version: bool,
}

impl DependencySelector {
    /// Whether a single candidate is selected
    pub fn accepts(&self, candidate: &Artifact) -> bool {
        if self.excludes.iter().any(|p| p.matches(candidate)) {
            return false;
        }
        match &self.includes {
            None => true,
            Some(includes) => includes.iter().any(|p| p.matches(candidate)),
        }
    }

    /// Select candidates in order
    pub fn select<'a>(&self, candidates: &'a [Artifact]) -> Vec<&'a Artifact> {
        candidates.iter().filter(|c| self.accepts(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(s: &str) -> CoordinatePattern {
        CoordinatePattern::parse(s).unwrap()
    }

    fn candidates() -> Vec<Artifact> {
        vec![
            Artifact::new("org.slf4j", "slf4j-api", "1.7.36"),
            Artifact::new("org.slf4j", "slf4j-simple", "2.0.9"),
            Artifact::new("com.google.guava", "guava", "32.1.2-jre"),
            Artifact::new("io.netty", "netty-transport", "4.1.100")
                .with_classifier("linux-x86_64"),
        ]
    }

    fn names(selected: &[&Artifact]) -> Vec<String> {
        selected.iter().map(|a| a.artifact.clone()).collect()
    }

    #[test]
    fn test_parse_rejects_bad_coordinates() {
        assert!(CoordinatePattern::parse("justone").is_err());
        assert!(CoordinatePattern::parse("a:b:c:d:e:f").is_err());
        assert!(CoordinatePattern::parse("a:b:[1.0,").is_err());
        assert!(CoordinatePattern::parse("").is_err());
    }

    #[test]
    fn test_wildcards_and_defaults() {
        let c = candidates();
        assert!(pattern("org.slf4j:*").matches(&c[0]));
        assert!(pattern(":slf4j-api").matches(&c[0]));
        assert!(pattern("*:*:*").matches(&c[2]));
        assert!(!pattern("org.slf4j:guava").matches(&c[2]));
    }

    #[test]
    fn test_version_ranges() {
        let c = candidates();
        assert!(pattern("org.slf4j:slf4j-api:[1.7,2.0)").matches(&c[0]));
        assert!(!pattern("org.slf4j:slf4j-simple:[1.7,2.0)").matches(&c[1]));
        assert!(pattern("org.slf4j:slf4j-simple:2.0.9").matches(&c[1]));
    }

    #[test]
    fn test_classifier_segment() {
        let c = candidates();
        assert!(pattern("io.netty:netty-transport:*:jar:linux-x86_64").matches(&c[3]));
        assert!(!pattern("io.netty:netty-transport:*:jar:osx").matches(&c[3]));
    }

    #[test]
    fn test_unresolved_version_never_matches() {
        let mut unresolved = Artifact::new("org.acme", "thing", "1.0");
        unresolved.version = None;
        assert!(!pattern("org.acme:thing").matches(&unresolved));
    }

    #[test]
    fn test_excludes_win_over_includes() {
        let c = candidates();
        let selector = DependencySelector {
            includes: Some(vec![pattern("org.slf4j:*")]),
            excludes: vec![pattern("org.slf4j:slf4j-simple")],
            strip_version: false,
        };
        assert_eq!(names(&selector.select(&c)), vec!["slf4j-api"]);
    }

    #[test]
    fn test_exclude_implies_never_selected() {
        let c = candidates();
        let excludes = vec![pattern("*:*")];
        for includes in [None, Some(vec![pattern("*:*")]), Some(Vec::new())] {
            let selector = DependencySelector {
                includes,
                excludes: excludes.clone(),
                strip_version: false,
            };
            assert!(selector.select(&c).is_empty());
        }
    }

    #[test]
    fn test_no_includes_admits_all() {
        let c = candidates();
        let selector = DependencySelector::default();
        assert_eq!(selector.select(&c).len(), c.len());
    }
}
