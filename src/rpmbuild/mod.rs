// src/rpmbuild/mod.rs

//! The rpmbuild work area and package build
//!
//! Layout below the configured work area:
//!
//! ```text
//! <workarea>/
//!   BUILD/ RPMS/ SOURCES/ SPECS/ SRPMS/
//!   tmp-buildroot/   staging root the installer writes to
//!   buildroot/       build root handed to rpmbuild
//! ```

use crate::descriptor::{PackageDescriptor, SigningSection};
use crate::error::{Error, Result};
use crate::process::{CommandRunner, ensure_success};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const TREE: [&str; 5] = ["BUILD", "RPMS", "SOURCES", "SPECS", "SRPMS"];

/// Directories of one package build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkArea {
    root: PathBuf,
}

impl WorkArea {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Staging root files are copied into
    pub fn staging(&self) -> PathBuf {
        self.root.join("tmp-buildroot")
    }

    pub fn buildroot(&self) -> PathBuf {
        self.root.join("buildroot")
    }

    pub fn specs(&self) -> PathBuf {
        self.root.join("SPECS")
    }

    pub fn rpms(&self) -> PathBuf {
        self.root.join("RPMS")
    }

    pub fn spec_path(&self, name: &str) -> PathBuf {
        self.specs().join(format!("{}.spec", name))
    }

    /// Create the tree, empty both build roots and drop packages left by
    /// earlier runs
    pub fn prepare(&self) -> Result<()> {
        let outputs = [self.staging(), self.buildroot(), self.rpms(), self.root.join("SRPMS")];
        for dir in outputs {
            if dir.exists() {
                debug!("Cleaning {}", dir.display());
                fs::remove_dir_all(&dir).map_err(Error::at(&dir))?;
            }
        }
        for name in TREE {
            let dir = self.root.join(name);
            fs::create_dir_all(&dir).map_err(Error::at(&dir))?;
        }
        let staging = self.staging();
        fs::create_dir_all(&staging).map_err(Error::at(&staging))?;
        Ok(())
    }

    /// Write the spec file to `SPECS/<name>.spec`
    pub fn write_spec(&self, name: &str, text: &str) -> Result<PathBuf> {
        let path = self.spec_path(name);
        fs::write(&path, text).map_err(Error::at(&path))?;
        info!("Wrote {}", path.display());
        Ok(path)
    }

    /// Every `.rpm` file below `RPMS/`
    pub fn packages(&self) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in WalkDir::new(self.rpms()).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.rpms());
                Error::io(path, e.into())
            })?;
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "rpm")
            {
                found.push(entry.into_path());
            }
        }
        Ok(found)
    }
}

/// Runs `rpmbuild` and optional signing
pub struct Packager<'a> {
    runner: &'a dyn CommandRunner,
    rpmbuild: PathBuf,
}

impl<'a> Packager<'a> {
    /// Use the `rpmbuild` found on `PATH`
    pub fn locate(runner: &'a dyn CommandRunner) -> Result<Self> {
        let rpmbuild = which::which("rpmbuild").map_err(|e| {
            Error::ResolutionError(format!("rpmbuild not found on PATH: {}", e))
        })?;
        Ok(Self::with_program(runner, &rpmbuild))
    }

    pub fn with_program(runner: &'a dyn CommandRunner, rpmbuild: &Path) -> Self {
        Self {
            runner,
            rpmbuild: rpmbuild.to_path_buf(),
        }
    }

    /// Arguments for a binary-only build of `spec`
    pub fn build_args(
        &self,
        descriptor: &PackageDescriptor,
        area: &WorkArea,
        spec: &Path,
    ) -> Vec<String> {
        vec![
            "-bb".to_string(),
            "--buildroot".to_string(),
            area.buildroot().display().to_string(),
            "--define".to_string(),
            format!("_topdir {}", area.root().display()),
            "--target".to_string(),
            descriptor.target_triple(),
            spec.display().to_string(),
        ]
    }

    /// Build the package, sign it when configured, and return the produced RPMs
    pub fn build(
        &self,
        descriptor: &PackageDescriptor,
        area: &WorkArea,
        spec: &Path,
    ) -> Result<Vec<PathBuf>> {
        let args = self.build_args(descriptor, area, spec);
        info!(
            "Building {}-{} for {}",
            descriptor.name,
            descriptor.version,
            descriptor.target_triple()
        );

        let program = self.rpmbuild.to_string_lossy();
        let output = self.runner.run_logged(&area.specs(), &program, &args)?;
        ensure_success(&program, &args, output)?;

        let packages = area.packages()?;
        if let Some(signing) = &descriptor.signing {
            self.sign(signing, area, &packages)?;
        }
        Ok(packages)
    }

    fn sign(&self, signing: &SigningSection, area: &WorkArea, packages: &[PathBuf]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        info!("Signing {} packages with key '{}'", packages.len(), signing.key);
        self.runner
            .run_checked(area.root(), "rpmsign", &sign_args(signing, packages))?;
        Ok(())
    }
}

/// `rpmsign` arguments for the given key and packages
pub fn sign_args(signing: &SigningSection, packages: &[PathBuf]) -> Vec<String> {
    let mut args = vec![
        "--addsign".to_string(),
        "--define".to_string(),
        format!("_gpg_name {}", signing.key),
    ];
    if let Some(home) = &signing.gpg_home {
        args.push("--define".to_string());
        args.push(format!("_gpg_path {}", home.display()));
    }
    args.extend(packages.iter().map(|p| p.display().to_string()));
    args
}
