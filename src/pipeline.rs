// src/pipeline.rs

//! One build run, end to end
//!
//! descriptor -> work area -> installer -> link planner -> composer -> spec
//! file. The macro evaluator is passed in so that a run owns exactly one
//! macro cache.

use crate::descriptor::PackageDescriptor;
use crate::error::Result;
use crate::filter::TokenFilter;
use crate::install::{FileCopier, FileInstaller, FsCopier, InstallReport, LinkPlan, LinkPlanner};
use crate::macros::MacroEvaluator;
use crate::rpmbuild::WorkArea;
use crate::select::ArtifactProvider;
use crate::spec::SpecComposer;
use std::path::PathBuf;
use tracing::info;

/// Staged files and planned links
#[derive(Debug, Clone)]
pub struct StagedPackage {
    pub area: WorkArea,
    pub report: InstallReport,
    pub links: LinkPlan,
}

/// A staged package with its written spec
#[derive(Debug, Clone)]
pub struct GeneratedSpec {
    pub staged: StagedPackage,
    pub spec: String,
    pub spec_path: PathBuf,
}

/// Runs the stages of a build for one descriptor
pub struct Pipeline<'a> {
    descriptor: &'a PackageDescriptor,
    artifacts: &'a dyn ArtifactProvider,
    copier: &'a dyn FileCopier,
    filter: TokenFilter,
}

impl<'a> Pipeline<'a> {
    pub fn new(descriptor: &'a PackageDescriptor, artifacts: &'a dyn ArtifactProvider) -> Self {
        let filter = TokenFilter::new(descriptor.build.properties.clone())
            .with_property("rpm.name", &descriptor.name)
            .with_property("rpm.version", &descriptor.version.version)
            .with_property("rpm.release", &descriptor.version.release);
        Self {
            descriptor,
            artifacts,
            copier: &FsCopier,
            filter,
        }
    }

    pub fn with_copier(mut self, copier: &'a dyn FileCopier) -> Self {
        self.copier = copier;
        self
    }

    pub fn work_area(&self) -> WorkArea {
        WorkArea::new(&self.descriptor.build.workarea)
    }

    /// Prepare the work area, stage every mapping and plan the links
    pub fn stage(&self, macros: &mut MacroEvaluator<'_>) -> Result<StagedPackage> {
        let area = self.work_area();
        area.prepare()?;
        let staging = area.staging();

        let installer = FileInstaller::new(
            &staging,
            &self.descriptor.build.base_dir,
            self.descriptor.target.clone(),
            self.artifacts,
            self.copier,
            &self.filter,
        );
        let mut installation = installer.install(&self.descriptor.mappings, macros)?;
        let links =
            LinkPlanner::new(&staging).plan(&installation.links, &mut installation.report)?;

        Ok(StagedPackage {
            area,
            report: installation.report,
            links,
        })
    }

    /// Stage, compose and write `SPECS/<name>.spec`
    pub fn generate(&self, macros: &mut MacroEvaluator<'_>) -> Result<GeneratedSpec> {
        let staged = self.stage(macros)?;
        let composer = SpecComposer::new(
            self.descriptor,
            &staged.area.staging(),
            &staged.area.buildroot(),
            &self.filter,
        );
        let spec = composer.compose(&staged.report, &staged.links)?;
        let spec_path = staged.area.write_spec(&self.descriptor.name, &spec)?;

        info!(
            "Generated spec for {}-{} ({} files, {} links)",
            self.descriptor.name,
            self.descriptor.version,
            staged.report.total_files(),
            staged.links.commands.len()
        );
        Ok(GeneratedSpec {
            staged,
            spec,
            spec_path,
        })
    }
}
