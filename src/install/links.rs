// src/install/links.rs

//! Soft-link planning
//!
//! Soft-link sources become `ln -s` commands in the `%install` section. A
//! destination fed by a single directory source that is linked in full is
//! replaced by one directory link, unless other mappings already staged
//! files there; everything else is linked file by file.

use super::{DeferredLink, InstallReport, LinkQueue, normalize_directory};
use crate::error::{Error, Result};
use crate::scan::DirectoryScanner;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Shell commands creating the links, in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkPlan {
    pub commands: Vec<String>,
}

/// Turns queued soft-link sources into link commands
pub struct LinkPlanner {
    staging: PathBuf,
}

impl LinkPlanner {
    pub fn new(staging: &Path) -> Self {
        Self {
            staging: staging.to_path_buf(),
        }
    }

    /// Plan every queued group, recording linked names in the report
    pub fn plan(&self, queue: &LinkQueue, report: &mut InstallReport) -> Result<LinkPlan> {
        let mut plan = LinkPlan::default();

        for group in queue.groups() {
            let collapse = group.links.len() == 1;
            for link in &group.links {
                self.plan_link(&group.directory, link, collapse, report, &mut plan)?;
            }
        }

        debug!("Planned {} link commands", plan.commands.len());
        Ok(plan)
    }

    fn plan_link(
        &self,
        directory: &str,
        link: &DeferredLink,
        collapse: bool,
        report: &mut InstallReport,
        plan: &mut LinkPlan,
    ) -> Result<()> {
        // Files copied into the destination would be lost to a directory link
        let occupied = report
            .mappings
            .iter()
            .any(|o| normalize_directory(&o.directory) == directory && !o.files.is_empty());
        let outcome = report.mappings.get_mut(link.mapping_index).ok_or_else(|| {
            Error::ResolutionError(format!(
                "Link {} refers to unknown mapping #{}",
                link.location, link.mapping_index
            ))
        })?;
        let staged_dir = self.staging.join(directory);
        let rename = link.source.destination.as_deref();

        let staged = if Path::new(&link.location).is_absolute() {
            self.staging.join(link.location.trim_start_matches('/'))
        } else {
            staged_dir.join(&link.location)
        };

        if staged.is_dir() {
            let mut scanner = DirectoryScanner::new(&staged)
                .with_includes(&link.source.includes)?
                .with_excludes(&link.source.excludes)?;
            if !link.source.no_default_excludes {
                scanner = scanner.with_default_excludes()?;
            }
            let scan = scanner.scan()?;

            if collapse && scan.everything_included && occupied && rename.is_none() {
                warn!(
                    "{} already holds staged files, linking {} file by file",
                    directory, link.location
                );
            } else if collapse && scan.everything_included {
                match rename {
                    None => {
                        if staged_dir.exists() {
                            fs::remove_dir_all(&staged_dir).map_err(Error::at(&staged_dir))?;
                        }
                        if let Some(parent) = staged_dir.parent() {
                            create_dir(parent)?;
                        }
                        plan.commands.push(format!(
                            "ln -s {} $RPM_BUILD_ROOT/{}",
                            link.location, directory
                        ));
                        outcome.replaced = true;
                    }
                    Some(name) => {
                        create_dir(&staged_dir)?;
                        plan.commands.push(link_command(&link.location, directory, name));
                        outcome.links.push(name.to_string());
                    }
                }
                return Ok(());
            }

            for file in &scan.files {
                if let Some(parent) = staged_dir.join(file).parent() {
                    create_dir(parent)?;
                }
                let target = format!("{}/{}", link.location.trim_end_matches('/'), file);
                plan.commands.push(link_command(&target, directory, file));
                outcome.links.push(file.clone());
            }
            return Ok(());
        }

        let name = match rename {
            Some(name) => name.to_string(),
            None => Path::new(&link.location)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| {
                    Error::ConfigError(format!("Link source {} has no file name", link.location))
                })?,
        };
        create_dir(&staged_dir)?;
        plan.commands.push(link_command(&link.location, directory, &name));
        outcome.links.push(name);
        Ok(())
    }
}

fn link_command(location: &str, directory: &str, name: &str) -> String {
    format!("ln -s {} $RPM_BUILD_ROOT/{}/{}", location, directory, name)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(Error::at(path))
}
