// src/descriptor/mapping.rs

//! Mappings and their sources

use crate::select::{
    ArtifactSelector, DependencySelector, PlatformFilter, TargetPlatform, platform_matches,
};
use serde::Deserialize;

fn default_true() -> bool {
    true
}

/// The `configuration` directive of a mapping: a flag or a `%config` modifier
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ConfigMarker {
    Flag(bool),
    /// "true", "false", "" or a modifier such as "noreplace"
    Text(String),
}

impl ConfigMarker {
    /// The `%config` token this marker contributes, if any
    pub fn token(&self) -> Option<String> {
        match self {
            ConfigMarker::Flag(true) => Some("%config".to_string()),
            ConfigMarker::Flag(false) => None,
            ConfigMarker::Text(text) => {
                let text = text.trim();
                if text.eq_ignore_ascii_case("true") {
                    Some("%config".to_string())
                } else if text.is_empty() || text.eq_ignore_ascii_case("false") {
                    None
                } else {
                    Some(format!("%config({})", text))
                }
            }
        }
    }
}

/// One origin of files for a mapping
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Source {
    /// File or directory; relative paths resolve against the project base
    pub location: String,
    /// Rename for a single-file source
    pub destination: Option<String>,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub no_default_excludes: bool,
    /// Pass file contents through the token filter
    pub filter: bool,
    pub target_architecture: Option<PlatformFilter>,
    pub target_os: Option<PlatformFilter>,
    /// When false a missing location is skipped with a warning
    pub fail_if_missing: bool,
    /// Create a symlink at package build time instead of copying
    pub soft_link: bool,
}

impl Default for Source {
    fn default() -> Self {
        Self {
            location: String::new(),
            destination: None,
            includes: Vec::new(),
            excludes: Vec::new(),
            no_default_excludes: false,
            filter: false,
            target_architecture: None,
            target_os: None,
            fail_if_missing: true,
            soft_link: false,
        }
    }
}

impl Source {
    pub fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            ..Default::default()
        }
    }

    /// Whether this source applies when building for `target`
    pub fn applies_to(&self, target: &TargetPlatform) -> bool {
        platform_matches(
            self.target_architecture.as_ref(),
            self.target_os.as_ref(),
            target,
        )
    }
}

/// A destination directory and everything that goes into it
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Mapping {
    pub directory: String,
    pub file_mode: Option<String>,
    pub user: Option<String>,
    pub group: Option<String>,
    pub configuration: Option<ConfigMarker>,
    pub documentation: bool,
    pub directory_included: bool,
    pub recurse_directories: bool,
    #[serde(rename = "source")]
    pub sources: Vec<Source>,
    pub artifact: Option<ArtifactSelector>,
    pub dependency: Option<DependencySelector>,
}

impl Default for Mapping {
    fn default() -> Self {
        Self {
            directory: String::new(),
            file_mode: None,
            user: None,
            group: None,
            configuration: None,
            documentation: false,
            directory_included: default_true(),
            recurse_directories: false,
            sources: Vec::new(),
            artifact: None,
            dependency: None,
        }
    }
}

impl Mapping {
    pub fn new(directory: &str) -> Self {
        Self {
            directory: directory.to_string(),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.sources.push(source);
        self
    }

    /// A mapping with nothing to copy only creates its directory
    pub fn is_directory_only(&self) -> bool {
        self.sources.is_empty() && self.artifact.is_none() && self.dependency.is_none()
    }

    /// Build the attribute prefix written before each `%files` path
    ///
    /// `%attr(...)` appears only when the mapping sets at least one of mode,
    /// user or group; unset slots fall back to the package defaults, then `-`.
    pub fn attr_string(&self, defaults: &FileDefaults) -> String {
        let mut tokens = Vec::new();

        if let Some(token) = self.configuration.as_ref().and_then(ConfigMarker::token) {
            tokens.push(token);
        }
        if self.documentation {
            tokens.push("%doc".to_string());
        }
        if self.is_directory_only() {
            tokens.push("%dir".to_string());
        }
        if self.file_mode.is_some() || self.user.is_some() || self.group.is_some() {
            let slot = |own: &Option<String>, fallback: &Option<String>| {
                own.as_deref()
                    .or(fallback.as_deref())
                    .unwrap_or("-")
                    .to_string()
            };
            tokens.push(format!(
                "%attr({},{},{})",
                slot(&self.file_mode, &defaults.file_mode),
                slot(&self.user, &defaults.user),
                slot(&self.group, &defaults.group),
            ));
        }

        tokens.join(" ")
    }
}

/// Package-wide default file attributes (`%defattr`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileDefaults {
    pub file_mode: Option<String>,
    pub dir_mode: Option<String>,
    pub user: Option<String>,
    pub group: Option<String>,
}

impl FileDefaults {
    /// `%defattr(file,user,group,dir)`, or `None` when no default is set
    pub fn defattr(&self) -> Option<String> {
        if self.file_mode.is_none()
            && self.dir_mode.is_none()
            && self.user.is_none()
            && self.group.is_none()
        {
            return None;
        }
        let slot = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
        Some(format!(
            "%defattr({},{},{},{})",
            slot(&self.file_mode),
            slot(&self.user),
            slot(&self.group),
            slot(&self.dir_mode),
        ))
    }
}
