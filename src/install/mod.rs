// src/install/mod.rs

//! Staging of mapped files
//!
//! The [`FileInstaller`] walks the mappings in order and copies every
//! applicable source, artifact and dependency into the staging root, which
//! later becomes the package build root. Soft-link sources are not copied;
//! they are queued per destination directory for the [`LinkPlanner`].
//!
//! What was written is returned as an [`InstallReport`] indexed by mapping
//! position, leaving the descriptor untouched.

mod copier;
mod links;

pub use copier::{Copied, CopyRequest, FileCopier, FsCopier};
pub use links::{LinkPlan, LinkPlanner};

use crate::descriptor::{Mapping, Source};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::macros::MacroEvaluator;
use crate::select::{Artifact, ArtifactProvider, TargetPlatform};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What the installer and link planner produced for one mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingOutcome {
    /// Destination directory after macro expansion
    pub directory: String,
    /// Materialized paths relative to the destination
    pub files: Vec<String>,
    /// Linked paths relative to the destination
    pub links: Vec<String>,
    /// The mapping queued at least one soft-link source
    pub has_deferred_links: bool,
    /// The whole destination directory was replaced by one link
    pub replaced: bool,
    /// Some source tree was copied only in part
    pub partial: bool,
}

/// Per-mapping installer output, indexed by mapping position
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub mappings: Vec<MappingOutcome>,
}

impl InstallReport {
    pub fn outcome(&self, index: usize) -> Option<&MappingOutcome> {
        self.mappings.get(index)
    }

    pub fn total_files(&self) -> usize {
        self.mappings.iter().map(|m| m.files.len()).sum()
    }
}

/// A soft-link source waiting for link planning
#[derive(Debug, Clone)]
pub struct DeferredLink {
    /// Position of the owning mapping
    pub mapping_index: usize,
    /// Macro-expanded location
    pub location: String,
    pub source: Source,
}

/// Soft-link sources for one destination directory
#[derive(Debug, Clone)]
pub struct LinkGroup {
    /// Destination without leading or trailing `/`
    pub directory: String,
    pub links: Vec<DeferredLink>,
}

/// Deferred links grouped by destination, in insertion order
#[derive(Debug, Clone, Default)]
pub struct LinkQueue {
    groups: Vec<LinkGroup>,
}

impl LinkQueue {
    pub fn push(&mut self, directory: &str, link: DeferredLink) {
        let directory = normalize_directory(directory);
        match self.groups.iter_mut().find(|g| g.directory == directory) {
            Some(group) => group.links.push(link),
            None => self.groups.push(LinkGroup {
                directory,
                links: vec![link],
            }),
        }
    }

    pub fn groups(&self) -> &[LinkGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Strip leading and trailing `/` from a destination
pub fn normalize_directory(directory: &str) -> String {
    directory.trim_matches('/').to_string()
}

/// Result of staging all mappings
#[derive(Debug, Clone, Default)]
pub struct Installation {
    pub report: InstallReport,
    pub links: LinkQueue,
}

/// Copies mapped sources into the staging root
pub struct FileInstaller<'a> {
    staging: PathBuf,
    base_dir: PathBuf,
    target: TargetPlatform,
    artifacts: &'a dyn ArtifactProvider,
    copier: &'a dyn FileCopier,
    filter: &'a dyn Filter,
}

impl<'a> FileInstaller<'a> {
    pub fn new(
        staging: &Path,
        base_dir: &Path,
        target: TargetPlatform,
        artifacts: &'a dyn ArtifactProvider,
        copier: &'a dyn FileCopier,
        filter: &'a dyn Filter,
    ) -> Self {
        Self {
            staging: staging.to_path_buf(),
            base_dir: base_dir.to_path_buf(),
            target,
            artifacts,
            copier,
            filter,
        }
    }

    /// Stage every mapping in order
    pub fn install(
        &self,
        mappings: &[Mapping],
        macros: &mut MacroEvaluator<'_>,
    ) -> Result<Installation> {
        let mut installation = Installation::default();

        for (index, mapping) in mappings.iter().enumerate() {
            let outcome = self.install_mapping(index, mapping, macros, &mut installation.links)?;
            installation.report.mappings.push(outcome);
        }

        info!(
            "Staged {} files for {} mappings",
            installation.report.total_files(),
            mappings.len()
        );
        Ok(installation)
    }

    fn install_mapping(
        &self,
        index: usize,
        mapping: &Mapping,
        macros: &mut MacroEvaluator<'_>,
        queue: &mut LinkQueue,
    ) -> Result<MappingOutcome> {
        let directory = macros.expand(&mapping.directory)?;
        let dest = self.staging.join(normalize_directory(&directory));
        let mut outcome = MappingOutcome {
            directory,
            ..Default::default()
        };

        if mapping.is_directory_only() {
            debug!("Creating directory-only mapping {}", outcome.directory);
            create_dir(&dest)?;
            return Ok(outcome);
        }

        for source in &mapping.sources {
            if !source.applies_to(&self.target) {
                debug!(
                    "Skipping source {} for {}/{}",
                    source.location, self.target.arch, self.target.os
                );
                continue;
            }

            let location = macros.expand(&source.location)?;
            if source.soft_link {
                queue.push(
                    &outcome.directory,
                    DeferredLink {
                        mapping_index: index,
                        location,
                        source: source.clone(),
                    },
                );
                outcome.has_deferred_links = true;
                continue;
            }

            let path = self.base_dir.join(&location);
            if !path.exists() {
                if !source.fail_if_missing {
                    warn!("Source {} does not exist, skipping", path.display());
                    continue;
                }
                return Err(Error::ConfigError(format!(
                    "Source {} for mapping {} does not exist",
                    path.display(),
                    outcome.directory
                )));
            }

            let request = CopyRequest {
                source: &path,
                destination_dir: &dest,
                rename: source.destination.as_deref(),
                includes: &source.includes,
                excludes: &source.excludes,
                default_excludes: !source.no_default_excludes,
                filter: source.filter.then_some(self.filter),
            };
            let copied = self.copier.copy(&request)?;
            outcome.partial |= !copied.complete;
            outcome.files.extend(copied.files);
        }

        if let Some(selector) = &mapping.artifact {
            for artifact in selector.select(self.artifacts) {
                let name = self.copy_artifact(artifact, &dest, false)?;
                outcome.files.push(name);
            }
        }

        if let Some(selector) = &mapping.dependency {
            for dependency in selector.select(self.artifacts.dependencies()) {
                let name = self.copy_artifact(dependency, &dest, selector.strip_version)?;
                outcome.files.push(name);
            }
        }

        if outcome.files.is_empty() && !outcome.has_deferred_links {
            create_dir(&dest)?;
        }

        debug!(
            "Mapping {} staged {} files",
            outcome.directory,
            outcome.files.len()
        );
        Ok(outcome)
    }

    fn copy_artifact(&self, artifact: &Artifact, dest: &Path, strip_version: bool) -> Result<String> {
        let file = artifact.file.as_ref().ok_or_else(|| {
            Error::ResolutionError(format!(
                "Artifact {} has not been built or resolved",
                artifact.coordinates()
            ))
        })?;
        let file = self.base_dir.join(file);
        let name = artifact.output_name(strip_version);
        let request = CopyRequest::new(&file, dest).with_rename(name.as_deref());
        let mut copied = self.copier.copy(&request)?;
        copied.files.pop().ok_or_else(|| {
            Error::ResolutionError(format!("Artifact {} produced no file", artifact.coordinates()))
        })
    }
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(Error::at(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::TokenFilter;
    use crate::macros::NoMacros;
    use crate::select::{ArtifactSelector, DependencySelector, StaticArtifacts};
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        artifacts: StaticArtifacts,
        filter: TokenFilter,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir_all(dir.path().join("dist/b")).unwrap();
            fs::write(dir.path().join("dist/a.txt"), "a").unwrap();
            fs::write(dir.path().join("dist/b/c.txt"), "c").unwrap();
            Self {
                dir,
                artifacts: StaticArtifacts::default(),
                filter: TokenFilter::default(),
            }
        }

        fn staging(&self) -> PathBuf {
            self.dir.path().join("staging")
        }

        fn run(&self, mappings: &[Mapping]) -> Result<Installation> {
            let installer = FileInstaller::new(
                &self.staging(),
                self.dir.path(),
                TargetPlatform::new("x86_64", "linux"),
                &self.artifacts,
                &FsCopier,
                &self.filter,
            );
            let mut macros = MacroEvaluator::new(NoMacros, &["app /opt/app".to_string()]);
            installer.install(mappings, &mut macros)
        }
    }

    #[test]
    fn test_directory_source_is_copied() {
        let fx = Fixture::new();
        let mapping = Mapping::new("%{app}").with_source(Source::new("dist"));
        let result = fx.run(&[mapping]).unwrap();

        let outcome = result.report.outcome(0).unwrap();
        assert_eq!(outcome.directory, "/opt/app");
        assert_eq!(outcome.files, vec!["a.txt", "b/c.txt"]);
        assert!(!outcome.partial);
        assert!(fx.staging().join("opt/app/b/c.txt").is_file());
        assert!(result.links.is_empty());
    }

    #[test]
    fn test_included_subset_marks_partial() {
        let fx = Fixture::new();
        let mut source = Source::new("dist");
        source.includes = vec!["a.txt".to_string()];
        let result = fx.run(&[Mapping::new("/opt/app").with_source(source)]).unwrap();
        assert_eq!(result.report.mappings[0].files, vec!["a.txt"]);
        assert!(result.report.mappings[0].partial);
    }

    #[test]
    fn test_directory_only_mapping_creates_directory() {
        let fx = Fixture::new();
        let result = fx.run(&[Mapping::new("/var/log/app")]).unwrap();
        assert!(result.report.mappings[0].files.is_empty());
        assert!(fx.staging().join("var/log/app").is_dir());
    }

    #[test]
    fn test_missing_source_policy() {
        let fx = Fixture::new();
        let mut optional = Source::new("nowhere");
        optional.fail_if_missing = false;
        let result = fx.run(&[Mapping::new("/opt/x").with_source(optional)]).unwrap();
        assert!(result.report.mappings[0].files.is_empty());
        assert!(fx.staging().join("opt/x").is_dir());

        let err = fx
            .run(&[Mapping::new("/opt/x").with_source(Source::new("nowhere"))])
            .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_soft_links_are_queued_per_directory() {
        let fx = Fixture::new();
        let mut link = Source::new("/usr/share/java/lib.jar");
        link.soft_link = true;
        let mappings = vec![
            Mapping::new("/opt/app/lib/").with_source(link.clone()),
            Mapping::new("opt/app/lib").with_source(link),
        ];
        let result = fx.run(&mappings).unwrap();

        assert_eq!(result.links.groups().len(), 1);
        let group = &result.links.groups()[0];
        assert_eq!(group.directory, "opt/app/lib");
        assert_eq!(group.links[1].mapping_index, 1);
        assert!(result.report.mappings.iter().all(|m| m.has_deferred_links));
    }

    #[test]
    fn test_platform_filtered_source_is_skipped() {
        let fx = Fixture::new();
        let mut source = Source::new("dist");
        source.target_architecture = Some(crate::select::PlatformFilter::new("aarch64").unwrap());
        let result = fx.run(&[Mapping::new("/opt/app").with_source(source)]).unwrap();
        assert!(result.report.mappings[0].files.is_empty());
    }

    #[test]
    fn test_artifacts_and_dependencies() {
        let mut fx = Fixture::new();
        let jar = fx.dir.path().join("app-1.0.jar");
        let dep = fx.dir.path().join("log-2.3.jar");
        fs::write(&jar, "jar").unwrap();
        fs::write(&dep, "dep").unwrap();
        fx.artifacts = StaticArtifacts {
            primary: Some(Artifact::new("org.acme", "app", "1.0").with_file(&jar)),
            secondary: Vec::new(),
            dependencies: vec![Artifact::new("org.log", "log", "2.3").with_file(&dep)],
        };

        let mut lib = Mapping::new("/opt/app/lib");
        lib.artifact = Some(ArtifactSelector::default());
        lib.dependency = Some(DependencySelector {
            strip_version: true,
            ..Default::default()
        });
        let result = fx.run(&[lib]).unwrap();
        assert_eq!(result.report.mappings[0].files, vec!["app-1.0.jar", "log.jar"]);
    }

    #[test]
    fn test_unbuilt_artifact_is_resolution_error() {
        let mut fx = Fixture::new();
        fx.artifacts.primary = Some(Artifact::new("org.acme", "app", "1.0"));
        let mut mapping = Mapping::new("/opt/app");
        mapping.artifact = Some(ArtifactSelector::default());
        let err = fx.run(&[mapping]).unwrap_err();
        assert!(matches!(err, Error::ResolutionError(_)));
    }
}
