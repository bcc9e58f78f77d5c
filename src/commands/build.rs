// src/commands/build.rs
//! Full package build through rpmbuild

use super::{is_disabled, load, macro_evaluator};
use crate::cli::DescriptorArgs;
use anyhow::{Context, Result};
use rpmweave::descriptor::SigningSection;
use rpmweave::pipeline::Pipeline;
use rpmweave::process::SystemRunner;
use rpmweave::rpmbuild::Packager;

/// Stage, write the spec and run rpmbuild
pub fn cmd_build(args: DescriptorArgs, sign: Option<String>) -> Result<()> {
    let mut loaded = load(&args)?;
    if is_disabled(&loaded.descriptor) {
        return Ok(());
    }

    if let Some(key) = sign {
        let gpg_home = loaded.descriptor.signing.take().and_then(|s| s.gpg_home);
        loaded.descriptor.signing = Some(SigningSection { key, gpg_home });
    }

    let mut macros = macro_evaluator(&loaded.descriptor, args.no_rpm_eval);
    let generated = Pipeline::new(&loaded.descriptor, &loaded.manifest.artifacts)
        .generate(&mut macros)
        .context("Failed to generate spec file")?;

    let runner = SystemRunner;
    let packager = Packager::locate(&runner)?;
    let packages = packager
        .build(&loaded.descriptor, &generated.staged.area, &generated.spec_path)
        .context("rpmbuild failed")?;

    if packages.is_empty() {
        anyhow::bail!(
            "rpmbuild finished but produced no packages in {}",
            generated.staged.area.rpms().display()
        );
    }
    for package in &packages {
        println!("{}", package.display());
    }
    Ok(())
}
