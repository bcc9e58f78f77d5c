// src/commands/plan.rs
//! Install and link report

use super::{is_disabled, load, macro_evaluator};
use crate::cli::{DescriptorArgs, PlanFormat};
use anyhow::{Context, Result};
use rpmweave::install::{InstallReport, LinkPlan};
use rpmweave::pipeline::Pipeline;
use serde::Serialize;

#[derive(Serialize)]
struct PlanOutput<'a> {
    mappings: &'a InstallReport,
    links: &'a LinkPlan,
}

/// Stage files and print what each mapping produced
pub fn cmd_plan(args: DescriptorArgs, format: PlanFormat) -> Result<()> {
    let loaded = load(&args)?;
    if is_disabled(&loaded.descriptor) {
        return Ok(());
    }

    let mut macros = macro_evaluator(&loaded.descriptor, args.no_rpm_eval);
    let staged = Pipeline::new(&loaded.descriptor, &loaded.manifest.artifacts)
        .stage(&mut macros)
        .context("Failed to stage files")?;

    match format {
        PlanFormat::Json => {
            let output = PlanOutput {
                mappings: &staged.report,
                links: &staged.links,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        PlanFormat::Text => {
            for outcome in &staged.report.mappings {
                println!("{}", outcome.directory);
                if outcome.replaced {
                    println!("  (replaced by a directory link)");
                }
                for file in &outcome.files {
                    println!("  file {}", file);
                }
                for link in &outcome.links {
                    println!("  link {}", link);
                }
            }
            if !staged.links.commands.is_empty() {
                println!();
                println!("Link commands:");
                for command in &staged.links.commands {
                    println!("  {}", command);
                }
            }
        }
    }
    Ok(())
}
