// src/select/artifact.rs

//! Build artifacts and artifact selection
//!
//! The surrounding build produces one primary artifact, any number of
//! secondary (classified) artifacts, and a resolved set of dependency
//! artifacts. Each may or may not have been materialized as a file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One artifact with its coordinates and backing file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub group: String,
    pub artifact: String,
    /// Resolved version; `None` when the build could not resolve one
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub classifier: Option<String>,
    /// Artifact type, also used as file extension when renaming
    #[serde(default = "default_kind", rename = "type")]
    pub kind: String,
    /// Backing file; `None` when the artifact was never materialized
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_kind() -> String {
    "jar".to_string()
}

impl Artifact {
    pub fn new(group: &str, artifact: &str, version: &str) -> Self {
        Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: Some(version.to_string()),
            classifier: None,
            kind: default_kind(),
            file: None,
        }
    }

    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = Some(classifier.to_string());
        self
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Classifier, treating an absent one as empty
    pub fn classifier_or_empty(&self) -> &str {
        self.classifier.as_deref().unwrap_or("")
    }

    /// `group:artifact:version[:classifier]` for messages
    pub fn coordinates(&self) -> String {
        let mut id = format!(
            "{}:{}:{}",
            self.group,
            self.artifact,
            self.version.as_deref().unwrap_or("?")
        );
        if let Some(classifier) = self.classifier.as_deref().filter(|c| !c.is_empty()) {
            id.push(':');
            id.push_str(classifier);
        }
        id
    }

    /// Output file name, either the backing file's name or
    /// `artifact[-classifier].type` when the version is stripped
    pub fn output_name(&self, strip_version: bool) -> Option<String> {
        if strip_version {
            let mut name = self.artifact.clone();
            if let Some(classifier) = self.classifier.as_deref().filter(|c| !c.is_empty()) {
                name.push('-');
                name.push_str(classifier);
            }
            name.push('.');
            name.push_str(&self.kind);
            return Some(name);
        }
        self.file
            .as_ref()
            .and_then(|f| f.file_name())
            .map(|n| n.to_string_lossy().to_string())
    }
}

/// Supplies the artifacts of the surrounding build
pub trait ArtifactProvider {
    fn primary(&self) -> Option<&Artifact>;
    fn secondary(&self) -> &[Artifact];
    fn dependencies(&self) -> &[Artifact];
}

/// Artifacts listed up front, e.g. in the `[artifacts]` descriptor section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticArtifacts {
    pub primary: Option<Artifact>,
    pub secondary: Vec<Artifact>,
    pub dependencies: Vec<Artifact>,
}

impl ArtifactProvider for StaticArtifacts {
    fn primary(&self) -> Option<&Artifact> {
        self.primary.as_ref()
    }

    fn secondary(&self) -> &[Artifact] {
        &self.secondary
    }

    fn dependencies(&self) -> &[Artifact] {
        &self.dependencies
    }
}

/// Which of the build's own artifacts a mapping receives
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArtifactSelector {
    /// `None`: primary plus every secondary artifact. Otherwise the primary
    /// only when an empty entry is listed, plus secondaries by classifier.
    pub classifiers: Option<Vec<String>>,
}

impl ArtifactSelector {
    /// Select artifacts in provider order, primary first
    pub fn select<'p>(&self, provider: &'p dyn ArtifactProvider) -> Vec<&'p Artifact> {
        let mut selected = Vec::new();

        match &self.classifiers {
            None => {
                selected.extend(provider.primary());
                selected.extend(provider.secondary());
            }
            Some(classifiers) => {
                if classifiers.iter().any(|c| c.is_empty()) {
                    selected.extend(provider.primary());
                }
                selected.extend(
                    provider
                        .secondary()
                        .iter()
                        .filter(|a| classifiers.iter().any(|c| c == a.classifier_or_empty())),
                );
            }
        }

        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> StaticArtifacts {
        StaticArtifacts {
            primary: Some(Artifact::new("org.acme", "app", "1.0").with_file("target/app-1.0.jar")),
            secondary: vec![
                Artifact::new("org.acme", "app", "1.0").with_classifier("sources"),
                Artifact::new("org.acme", "app", "1.0").with_classifier("javadoc"),
            ],
            dependencies: Vec::new(),
        }
    }

    fn classifiers(selected: &[&Artifact]) -> Vec<String> {
        selected.iter().map(|a| a.classifier_or_empty().to_string()).collect()
    }

    #[test]
    fn test_no_list_selects_everything() {
        let p = provider();
        let selected = ArtifactSelector::default().select(&p);
        assert_eq!(classifiers(&selected), vec!["", "sources", "javadoc"]);
    }

    #[test]
    fn test_list_without_empty_entry_skips_primary() {
        let p = provider();
        let selector = ArtifactSelector {
            classifiers: Some(vec!["javadoc".to_string()]),
        };
        assert_eq!(classifiers(&selector.select(&p)), vec!["javadoc"]);
    }

    #[test]
    fn test_empty_entry_selects_primary() {
        let p = provider();
        let selector = ArtifactSelector {
            classifiers: Some(vec!["".to_string(), "sources".to_string()]),
        };
        assert_eq!(classifiers(&selector.select(&p)), vec!["", "sources"]);
    }

    #[test]
    fn test_output_name() {
        let a = Artifact::new("org.acme", "lib", "2.1")
            .with_classifier("linux")
            .with_file("/repo/lib-2.1-linux.jar");
        assert_eq!(a.output_name(false).as_deref(), Some("lib-2.1-linux.jar"));
        assert_eq!(a.output_name(true).as_deref(), Some("lib-linux.jar"));

        let unresolved = Artifact::new("org.acme", "lib", "2.1");
        assert_eq!(unresolved.output_name(false), None);
        assert_eq!(unresolved.coordinates(), "org.acme:lib:2.1");
    }
}
