// src/install/copier.rs

//! Copying sources into the staging root

use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::scan::DirectoryScanner;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// One copy operation
pub struct CopyRequest<'a> {
    /// Existing file or directory
    pub source: &'a Path,
    /// Directory the source lands in
    pub destination_dir: &'a Path,
    /// New name for a single-file source
    pub rename: Option<&'a str>,
    pub includes: &'a [String],
    pub excludes: &'a [String],
    pub default_excludes: bool,
    /// Filter applied to file contents
    pub filter: Option<&'a dyn Filter>,
}

impl<'a> CopyRequest<'a> {
    /// Plain copy of a file or tree with default excludes
    pub fn new(source: &'a Path, destination_dir: &'a Path) -> Self {
        Self {
            source,
            destination_dir,
            rename: None,
            includes: &[],
            excludes: &[],
            default_excludes: true,
            filter: None,
        }
    }

    pub fn with_rename(mut self, rename: Option<&'a str>) -> Self {
        self.rename = rename;
        self
    }
}

/// What a copy wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Copied {
    /// Written paths relative to the destination directory
    pub files: Vec<String>,
    /// False when includes or excludes left part of a source tree behind
    pub complete: bool,
}

/// Copies a source into a destination directory
pub trait FileCopier {
    fn copy(&self, request: &CopyRequest<'_>) -> Result<Copied>;
}

/// Filesystem copier
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCopier;

impl FileCopier for FsCopier {
    fn copy(&self, request: &CopyRequest<'_>) -> Result<Copied> {
        let metadata = fs::metadata(request.source).map_err(Error::at(request.source))?;

        if let Some(rename) = request.rename {
            if !metadata.is_file() {
                return Err(Error::ConfigError(format!(
                    "Source {} is renamed to '{}' but is not a regular file",
                    request.source.display(),
                    rename
                )));
            }
        }

        if metadata.is_file() {
            let name = match request.rename {
                Some(rename) => rename.to_string(),
                None => request
                    .source
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .ok_or_else(|| {
                        Error::ConfigError(format!(
                            "Source {} has no file name",
                            request.source.display()
                        ))
                    })?,
            };
            fs::create_dir_all(request.destination_dir)
                .map_err(Error::at(request.destination_dir))?;
            copy_file(
                request.source,
                &request.destination_dir.join(&name),
                request.filter,
            )?;
            return Ok(Copied {
                files: vec![name],
                complete: true,
            });
        }

        let mut scanner = DirectoryScanner::new(request.source)
            .with_includes(request.includes)?
            .with_excludes(request.excludes)?;
        if request.default_excludes {
            scanner = scanner.with_default_excludes()?;
        }
        let scan = scanner.scan()?;

        fs::create_dir_all(request.destination_dir).map_err(Error::at(request.destination_dir))?;
        for dir in &scan.directories {
            let target = request.destination_dir.join(dir);
            fs::create_dir_all(&target).map_err(Error::at(&target))?;
        }
        for file in &scan.files {
            let target = request.destination_dir.join(file);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(Error::at(parent))?;
            }
            copy_file(&request.source.join(file), &target, request.filter)?;
        }

        debug!(
            "Copied {} files from {} to {}",
            scan.files.len(),
            request.source.display(),
            request.destination_dir.display()
        );
        Ok(Copied {
            files: scan.files,
            complete: scan.everything_included,
        })
    }
}

fn copy_file(source: &Path, target: &Path, filter: Option<&dyn Filter>) -> Result<()> {
    let metadata = fs::symlink_metadata(source).map_err(Error::at(source))?;

    #[cfg(unix)]
    if metadata.file_type().is_symlink() {
        let link = fs::read_link(source).map_err(Error::at(source))?;
        if target.symlink_metadata().is_ok() {
            fs::remove_file(target).map_err(Error::at(target))?;
        }
        std::os::unix::fs::symlink(&link, target).map_err(Error::at(target))?;
        return Ok(());
    }

    if let Some(filter) = filter {
        let bytes = fs::read(source).map_err(Error::at(source))?;
        match String::from_utf8(bytes) {
            Ok(text) => {
                fs::write(target, filter.filter(&text)).map_err(Error::at(target))?;
                fs::set_permissions(target, metadata.permissions()).map_err(Error::at(target))?;
                return Ok(());
            }
            Err(_) => warn!("{} is not UTF-8 text, copying unfiltered", source.display()),
        }
    }

    fs::copy(source, target).map_err(Error::at(target))?;
    Ok(())
}
