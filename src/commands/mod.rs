// src/commands/mod.rs
//! Command handlers for the rpmweave CLI

mod build;
mod completions;
mod plan;
mod spec;
mod version;

pub use build::cmd_build;
pub use completions::cmd_completions;
pub use plan::cmd_plan;
pub use spec::cmd_spec;
pub use version::cmd_version;

use crate::cli::DescriptorArgs;
use anyhow::{Context, Result};
use rpmweave::descriptor::{MANIFEST_FILE, PackageDescriptor, PackageManifest};
use rpmweave::macros::{MacroEvaluator, NoMacros, RpmEvalBackend};
use rpmweave::process::SystemRunner;
use std::path::{Path, PathBuf};
use tracing::info;

/// A descriptor loaded for one command
pub(crate) struct Loaded {
    pub descriptor: PackageDescriptor,
    pub manifest: PackageManifest,
}

/// Find and validate the descriptor named on the command line
pub(crate) fn load(args: &DescriptorArgs) -> Result<Loaded> {
    let path = Path::new(&args.descriptor);
    let manifest_path: PathBuf = if path.is_dir() {
        path.join(MANIFEST_FILE)
    } else {
        path.to_path_buf()
    };

    if !manifest_path.exists() {
        anyhow::bail!("No {} found at {}", MANIFEST_FILE, manifest_path.display());
    }

    let (mut descriptor, manifest) = PackageDescriptor::load(&manifest_path)
        .with_context(|| format!("Failed to load {}", manifest_path.display()))?;
    descriptor.defines.extend(args.defines.iter().cloned());

    info!(
        "Loaded {} {} from {}",
        descriptor.name,
        descriptor.version,
        manifest_path.display()
    );
    Ok(Loaded {
        descriptor,
        manifest,
    })
}

/// Macro evaluator for one run
pub(crate) fn macro_evaluator(
    descriptor: &PackageDescriptor,
    no_rpm_eval: bool,
) -> MacroEvaluator<'static> {
    if no_rpm_eval {
        MacroEvaluator::new(NoMacros, &descriptor.defines)
    } else {
        MacroEvaluator::new(
            RpmEvalBackend::new(&SystemRunner, &descriptor.build.base_dir),
            &descriptor.defines,
        )
    }
}

/// Log and report whether the descriptor disables building
pub(crate) fn is_disabled(descriptor: &PackageDescriptor) -> bool {
    if descriptor.build.disabled {
        info!("Packaging of {} is disabled, nothing to do", descriptor.name);
    }
    descriptor.build.disabled
}
