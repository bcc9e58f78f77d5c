// src/descriptor/manifest.rs

//! Package descriptor file (rpmweave.toml) parsing
//!
//! These types mirror the TOML layout one to one. They are turned into a
//! validated [`PackageDescriptor`](super::PackageDescriptor) before any file
//! is touched.

use crate::descriptor::mapping::{FileDefaults, Mapping};
use crate::descriptor::scriptlet::{Scriptlet, Trigger};
use crate::error::{Error, Result};
use crate::select::StaticArtifacts;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default descriptor file name
pub const MANIFEST_FILE: &str = "rpmweave.toml";

/// Root structure of rpmweave.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub package: PackageSection,

    #[serde(default)]
    pub defaults: FileDefaults,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub signing: Option<SigningSection>,

    #[serde(default, rename = "mapping")]
    pub mappings: Vec<Mapping>,

    /// Canonical `[scriptlets.<phase>]` tables and legacy
    /// `<phase>_script`, `<phase>_script_file`, `<phase>_program` keys
    #[serde(default)]
    pub scriptlets: BTreeMap<String, ScriptletEntry>,

    #[serde(default, rename = "trigger")]
    pub triggers: Vec<Trigger>,

    /// Artifacts of the surrounding build, when not supplied programmatically
    #[serde(default)]
    pub artifacts: StaticArtifacts,
}

impl PackageManifest {
    /// Load a descriptor from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(Error::at(path))?;
        Self::parse(&content)
    }

    /// Parse a descriptor from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: PackageManifest = toml::from_str(content)?;
        Ok(manifest)
    }
}

/// `[package]`: header metadata
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PackageSection {
    pub name: String,
    /// Raw project version, may carry a `-qualifier`
    pub version: String,
    pub release: Option<String>,
    pub summary: Option<String>,
    pub license: Option<String>,
    pub distribution: Option<String>,
    pub icon: Option<String>,
    pub vendor: Option<String>,
    pub url: Option<String>,
    pub group: Option<String>,
    pub packager: Option<String>,
    pub description: Option<String>,
    pub changelog: Option<String>,
    pub changelog_file: Option<PathBuf>,
    /// Target architecture; "noarch" for architecture-independent packages
    pub architecture: Option<String>,
    pub os: Option<String>,
    pub target_vendor: Option<String>,
    pub auto_provides: bool,
    pub auto_requires: bool,
    pub provides: Vec<String>,
    pub requires: Vec<String>,
    pub prereqs: Vec<String>,
    pub obsoletes: Vec<String>,
    pub conflicts: Vec<String>,
    pub prefixes: Vec<String>,
    /// `%define` statements as "name value"
    pub defines: Vec<String>,
    pub source_encoding: Option<String>,
}

impl Default for PackageSection {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            release: None,
            summary: None,
            license: None,
            distribution: None,
            icon: None,
            vendor: None,
            url: None,
            group: None,
            packager: None,
            description: None,
            changelog: None,
            changelog_file: None,
            architecture: None,
            os: None,
            target_vendor: None,
            auto_provides: true,
            auto_requires: true,
            provides: Vec::new(),
            requires: Vec::new(),
            prereqs: Vec::new(),
            obsoletes: Vec::new(),
            conflicts: Vec::new(),
            prefixes: Vec::new(),
            defines: Vec::new(),
            source_encoding: None,
        }
    }
}

/// `[build]`: where the build happens
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Work area holding the rpmbuild tree; relative to the base directory
    pub workarea: PathBuf,
    /// Project base directory; defaults to the descriptor's directory
    pub base_dir: Option<PathBuf>,
    /// Root for `classpath:` script files; defaults to `<base>/resources`
    pub resource_root: Option<PathBuf>,
    /// Token values for filtered sources and scriptlets
    pub properties: BTreeMap<String, String>,
    /// Skip the build entirely
    pub disabled: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            workarea: PathBuf::from("target/rpm"),
            base_dir: None,
            resource_root: None,
            properties: BTreeMap::new(),
            disabled: false,
        }
    }
}

/// `[signing]`: GPG signing of the built package
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SigningSection {
    /// GPG key name (`_gpg_name`)
    pub key: String,
    /// Alternate GPG home directory
    pub gpg_home: Option<PathBuf>,
}

/// One entry of the `[scriptlets]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ScriptletEntry {
    Table(Scriptlet),
    Text(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[package]
name = "acme-server"
version = "2.0.1-SNAPSHOT"
summary = "Acme server"
requires = ["java-17-openjdk-headless"]
defines = ["app_home /opt/acme"]

[defaults]
file_mode = "644"
user = "root"

[build]
workarea = "out/rpm"

[build.properties]
"project.version" = "2.0.1"

[[mapping]]
directory = "%{app_home}/lib"

[mapping.dependency]
excludes = ["junit:junit"]
strip_version = true

[[mapping]]
directory = "%{app_home}/conf"
configuration = true

[[mapping.source]]
location = "src/main/conf"
filter = true

[scriptlets]
pre_uninstall_script = "systemctl stop acme"

[scriptlets.post_install]
script = "systemctl daemon-reload"

[[trigger]]
kind = "install"
script = "echo httpd changed"
conditions = ["httpd >= 2.4"]

[artifacts.primary]
group = "com.acme"
artifact = "acme-server"
version = "2.0.1-SNAPSHOT"
file = "target/acme-server.jar"
"#;

    #[test]
    fn test_parse_sample() {
        let manifest = PackageManifest::parse(SAMPLE).unwrap();
        assert_eq!(manifest.package.name, "acme-server");
        assert!(manifest.package.auto_provides);
        assert_eq!(manifest.defaults.file_mode.as_deref(), Some("644"));
        assert_eq!(manifest.build.workarea, PathBuf::from("out/rpm"));
        assert_eq!(manifest.mappings.len(), 2);
        assert!(manifest.mappings[0].dependency.as_ref().unwrap().strip_version);
        assert!(manifest.mappings[1].sources[0].filter);
        assert!(matches!(
            manifest.scriptlets.get("post_install"),
            Some(ScriptletEntry::Table(_))
        ));
        assert!(matches!(
            manifest.scriptlets.get("pre_uninstall_script"),
            Some(ScriptletEntry::Text(_))
        ));
        assert_eq!(manifest.triggers[0].conditions, vec!["httpd >= 2.4"]);
        assert_eq!(manifest.artifacts.primary.unwrap().kind, "jar");
    }

    #[test]
    fn test_invalid_coordinate_is_rejected() {
        let err = PackageManifest::parse(
            r#"
[[mapping]]
directory = "/opt/lib"
[mapping.dependency]
includes = ["not-a-coordinate"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }
}
