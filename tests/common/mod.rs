// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use rpmweave::macros::{MacroEvaluator, NoMacros};
use rpmweave::pipeline::{GeneratedSpec, Pipeline};
use rpmweave::{PackageDescriptor, PackageManifest, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway project directory holding sources and an rpmweave.toml.
///
/// Keep the value alive for as long as the files are needed.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file below the project root, creating parent directories
    pub fn file(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    /// Write the descriptor and return its path
    pub fn descriptor(&self, toml_text: &str) -> PathBuf {
        self.file("rpmweave.toml", toml_text)
    }

    /// Staging root of the default work area
    pub fn staging(&self) -> PathBuf {
        self.path().join("target/rpm/tmp-buildroot")
    }

    /// Load the descriptor and generate the spec without consulting rpm
    pub fn generate(&self) -> Result<GeneratedSpec> {
        let (descriptor, manifest) =
            PackageDescriptor::load(&self.path().join("rpmweave.toml"))?;
        generate_with(&descriptor, &manifest)
    }
}

/// Generate a spec for an already loaded descriptor
pub fn generate_with(
    descriptor: &PackageDescriptor,
    manifest: &PackageManifest,
) -> Result<GeneratedSpec> {
    let mut macros = MacroEvaluator::new(NoMacros, &descriptor.defines);
    Pipeline::new(descriptor, &manifest.artifacts).generate(&mut macros)
}

/// The lines of the `%files` section, without the section header
pub fn files_section(spec: &str) -> Vec<String> {
    spec.lines()
        .skip_while(|l| *l != "%files")
        .skip(1)
        .take_while(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// The lines of the `%install` section after the staging move
pub fn install_commands(spec: &str) -> Vec<String> {
    spec.lines()
        .skip_while(|l| *l != "fi")
        .skip(1)
        .take_while(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
