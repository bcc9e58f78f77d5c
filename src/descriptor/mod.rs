// src/descriptor/mod.rs

//! The package descriptor: what goes where, and how the package is described
//!
//! A [`PackageManifest`] is read from TOML and validated into a
//! [`PackageDescriptor`], which is immutable for the rest of the build.
//! Validation performs every configuration check up front so that a bad
//! descriptor fails before any file is copied.

mod manifest;
mod mapping;
mod scriptlet;

pub use manifest::{
    BuildSection, MANIFEST_FILE, PackageManifest, PackageSection, ScriptletEntry, SigningSection,
};
pub use mapping::{ConfigMarker, FileDefaults, Mapping, Source};
pub use scriptlet::{Scriptlet, ScriptletPhase, Trigger, TriggerKind, resolve_scriptlet};

use crate::error::{Error, Result};
use crate::select::{NOARCH, TargetPlatform, host_arch};
use crate::version::VersionSpec;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

/// Text encodings accepted for script and changelog files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl TextEncoding {
    pub fn parse(label: &str) -> Result<Self> {
        match label.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "iso-8859-1" | "latin1" | "latin-1" => Ok(Self::Latin1),
            "us-ascii" | "ascii" => Ok(Self::Ascii),
            other => Err(Error::ConfigError(format!("Unsupported encoding '{}'", other))),
        }
    }

    /// Decode file contents; `path` is used for error messages
    pub fn decode(&self, bytes: Vec<u8>, path: &Path) -> Result<String> {
        let invalid = |msg: String| Error::io(path, io::Error::new(io::ErrorKind::InvalidData, msg));
        match self {
            Self::Utf8 => String::from_utf8(bytes).map_err(|e| invalid(e.to_string())),
            Self::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Self::Ascii => {
                if let Some(pos) = bytes.iter().position(|b| !b.is_ascii()) {
                    return Err(invalid(format!("non-ASCII byte at offset {}", pos)));
                }
                Ok(bytes.iter().map(|&b| b as char).collect())
            }
        }
    }

    /// Read and decode a file
    pub fn read(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path).map_err(Error::at(path))?;
        self.decode(bytes, path)
    }
}

/// Where the build reads from and writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Project base directory; relative source locations resolve here
    pub base_dir: PathBuf,
    /// Work area holding the rpmbuild tree
    pub workarea: PathBuf,
    /// Root for `classpath:` script files
    pub resource_root: PathBuf,
    /// Token filter properties
    pub properties: BTreeMap<String, String>,
    pub disabled: bool,
}

/// A validated package description
#[derive(Debug, Clone)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: VersionSpec,
    pub summary: Option<String>,
    pub license: Option<String>,
    pub distribution: Option<String>,
    pub icon: Option<String>,
    pub vendor: Option<String>,
    pub url: Option<String>,
    pub group: Option<String>,
    pub packager: Option<String>,
    pub description: Option<String>,
    pub target: TargetPlatform,
    pub target_vendor: String,
    /// Provides, with obsoleted packages merged in
    pub provides: Vec<String>,
    pub requires: Vec<String>,
    pub prereqs: Vec<String>,
    pub obsoletes: Vec<String>,
    pub conflicts: Vec<String>,
    pub prefixes: Vec<String>,
    pub auto_provides: bool,
    pub auto_requires: bool,
    pub defines: Vec<String>,
    pub defaults: FileDefaults,
    pub mappings: Vec<Mapping>,
    pub scriptlets: BTreeMap<ScriptletPhase, Scriptlet>,
    pub triggers: Vec<Trigger>,
    pub changelog: Option<String>,
    pub source_encoding: TextEncoding,
    pub build: BuildSettings,
    pub signing: Option<SigningSection>,
}

impl PackageDescriptor {
    /// Load and validate a descriptor file; the base directory defaults to
    /// the file's directory
    pub fn load(path: &Path) -> Result<(Self, PackageManifest)> {
        let manifest = PackageManifest::from_file(path)?;
        let dir = path.parent().unwrap_or(Path::new("."));
        let descriptor = Self::from_manifest(&manifest, dir)?;
        Ok((descriptor, manifest))
    }

    /// Validate a manifest
    pub fn from_manifest(manifest: &PackageManifest, manifest_dir: &Path) -> Result<Self> {
        let package = &manifest.package;

        if package.name.trim().is_empty() {
            return Err(Error::ConfigError("Missing required field: package.name".to_string()));
        }
        if package.version.trim().is_empty() {
            return Err(Error::ConfigError(
                "Missing required field: package.version".to_string(),
            ));
        }

        let base_dir = match &manifest.build.base_dir {
            Some(dir) => manifest_dir.join(dir),
            None => manifest_dir.to_path_buf(),
        };
        let build = BuildSettings {
            workarea: base_dir.join(&manifest.build.workarea),
            resource_root: manifest
                .build
                .resource_root
                .as_ref()
                .map(|r| base_dir.join(r))
                .unwrap_or_else(|| base_dir.join("resources")),
            properties: manifest.build.properties.clone(),
            disabled: manifest.build.disabled,
            base_dir,
        };

        let source_encoding = match &package.source_encoding {
            Some(label) => TextEncoding::parse(label)?,
            None => TextEncoding::default(),
        };

        for (idx, mapping) in manifest.mappings.iter().enumerate() {
            validate_mapping(idx, mapping)?;
        }

        let scriptlets = resolve_scriptlets(&manifest.scriptlets)?;
        for scriptlet in scriptlets.values() {
            if let Some(label) = &scriptlet.encoding {
                TextEncoding::parse(label)?;
            }
        }

        for trigger in &manifest.triggers {
            trigger.validate()?;
        }

        let changelog = match (&package.changelog, &package.changelog_file) {
            (Some(text), _) => Some(text.clone()),
            (None, Some(file)) => Some(source_encoding.read(&build.base_dir.join(file))?),
            (None, None) => None,
        };

        let release = package
            .release
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        let architecture = package
            .architecture
            .clone()
            .unwrap_or_else(|| host_arch().to_string());

        Ok(Self {
            name: package.name.trim().to_string(),
            version: VersionSpec::resolve(package.version.trim(), release),
            summary: package.summary.clone(),
            license: package.license.clone(),
            distribution: package.distribution.clone(),
            icon: package.icon.clone(),
            vendor: package.vendor.clone(),
            url: package.url.clone(),
            group: package.group.clone(),
            packager: package.packager.clone(),
            description: package.description.clone(),
            target: TargetPlatform::new(
                &architecture,
                package.os.as_deref().unwrap_or("linux"),
            ),
            target_vendor: package.target_vendor.clone().unwrap_or_else(|| "none".to_string()),
            provides: merge_obsoletes(&package.provides, &package.obsoletes),
            requires: package.requires.clone(),
            prereqs: package.prereqs.clone(),
            obsoletes: package.obsoletes.clone(),
            conflicts: package.conflicts.clone(),
            prefixes: package.prefixes.clone(),
            auto_provides: package.auto_provides,
            auto_requires: package.auto_requires,
            defines: package.defines.clone(),
            defaults: manifest.defaults.clone(),
            mappings: manifest.mappings.clone(),
            scriptlets,
            triggers: manifest.triggers.clone(),
            changelog,
            source_encoding,
            build,
            signing: manifest.signing.clone().filter(|s| !s.key.trim().is_empty()),
        })
    }

    /// Architecture-independent package
    pub fn is_noarch(&self) -> bool {
        self.target.arch == NOARCH
    }

    /// `<arch>-<vendor>-<os>` for `rpmbuild --target`
    pub fn target_triple(&self) -> String {
        format!("{}-{}-{}", self.target.arch, self.target_vendor, self.target.os)
    }
}

fn validate_mapping(idx: usize, mapping: &Mapping) -> Result<()> {
    if mapping.directory.trim().is_empty() {
        return Err(Error::ConfigError(format!(
            "Mapping #{} has no destination directory",
            idx + 1
        )));
    }
    for source in &mapping.sources {
        if source.location.trim().is_empty() {
            return Err(Error::ConfigError(format!(
                "Mapping '{}' has a source without a location",
                mapping.directory
            )));
        }
    }
    Ok(())
}

/// Provides with obsoleted package names appended, without duplicates
fn merge_obsoletes(provides: &[String], obsoletes: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    provides
        .iter()
        .chain(obsoletes)
        .filter(|p| seen.insert(p.as_str()))
        .cloned()
        .collect()
}

/// Fold canonical tables and legacy keys of the `[scriptlets]` table
fn resolve_scriptlets(
    entries: &BTreeMap<String, ScriptletEntry>,
) -> Result<BTreeMap<ScriptletPhase, Scriptlet>> {
    let mut known = BTreeSet::new();
    let mut resolved = BTreeMap::new();

    for phase in ScriptletPhase::ALL {
        let key = phase.key();
        let table_key = key.to_string();
        let script_key = format!("{}_script", key);
        let file_key = format!("{}_script_file", key);
        let program_key = format!("{}_program", key);

        let canonical = match entries.get(&table_key) {
            Some(ScriptletEntry::Table(s)) => Some(s.clone()),
            Some(ScriptletEntry::Text(_)) => {
                return Err(Error::ConfigError(format!(
                    "scriptlets.{} must be a table",
                    table_key
                )));
            }
            None => None,
        };
        let text = |k: &str| -> Result<Option<String>> {
            match entries.get(k) {
                Some(ScriptletEntry::Text(t)) => Ok(Some(t.clone())),
                Some(ScriptletEntry::Table(_)) => Err(Error::ConfigError(format!(
                    "scriptlets.{} must be a string",
                    k
                ))),
                None => Ok(None),
            }
        };

        let scriptlet = resolve_scriptlet(
            phase,
            canonical,
            text(&script_key)?,
            text(&file_key)?,
            text(&program_key)?,
        );
        if let Some(scriptlet) = scriptlet {
            resolved.insert(phase, scriptlet);
        }

        known.extend([table_key, script_key, file_key, program_key]);
    }

    if let Some(unknown) = entries.keys().find(|k| !known.contains(*k)) {
        return Err(Error::ConfigError(format!("Unknown scriptlet key '{}'", unknown)));
    }

    Ok(resolved)
}
