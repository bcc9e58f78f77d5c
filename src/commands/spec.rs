// src/commands/spec.rs
//! Spec file generation

use super::{is_disabled, load, macro_evaluator};
use crate::cli::DescriptorArgs;
use anyhow::{Context, Result};
use rpmweave::pipeline::Pipeline;

/// Stage files and write the spec file
pub fn cmd_spec(args: DescriptorArgs) -> Result<()> {
    let loaded = load(&args)?;
    if is_disabled(&loaded.descriptor) {
        return Ok(());
    }

    let mut macros = macro_evaluator(&loaded.descriptor, args.no_rpm_eval);
    let generated = Pipeline::new(&loaded.descriptor, &loaded.manifest.artifacts)
        .generate(&mut macros)
        .context("Failed to generate spec file")?;

    println!("{}", generated.spec_path.display());
    Ok(())
}
