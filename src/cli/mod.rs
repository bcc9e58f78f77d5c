// src/cli/mod.rs
//! CLI definitions for rpmweave
//!
//! The command implementations live in the `commands` module.
//!
//! - `spec` - stage files and write the spec file
//! - `build` - stage, write the spec and run rpmbuild
//! - `plan` - show what would be staged and linked
//! - `version` - resolve an RPM version/release pair
//! - `completions` - shell completion scripts

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "rpmweave")]
#[command(author = "rpmweave Contributors")]
#[command(version)]
#[command(
    about = "Compile declarative file mappings into an RPM build root and spec file",
    long_about = None
)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that reads a descriptor
#[derive(Args, Debug, Clone)]
pub struct DescriptorArgs {
    /// Path to rpmweave.toml or the directory containing it
    #[arg(short = 'f', long, default_value = ".")]
    pub descriptor: String,

    /// Extra macro definition as "name value" (repeatable)
    #[arg(short = 'D', long = "define", value_name = "NAME VALUE")]
    pub defines: Vec<String>,

    /// Do not ask `rpm --eval` for macro values
    #[arg(long)]
    pub no_rpm_eval: bool,
}

/// Output format of `plan`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stage files and write SPECS/<name>.spec
    Spec {
        #[command(flatten)]
        args: DescriptorArgs,
    },

    /// Stage files, write the spec and run rpmbuild
    Build {
        #[command(flatten)]
        args: DescriptorArgs,

        /// Sign the built packages with this GPG key name
        #[arg(long, value_name = "KEY")]
        sign: Option<String>,
    },

    /// Stage files and show the per-mapping report and link commands
    Plan {
        #[command(flatten)]
        args: DescriptorArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: PlanFormat,
    },

    /// Resolve the RPM version and release for a project version
    Version {
        /// Project version, e.g. 1.2.3-SNAPSHOT
        version: String,

        /// Explicit release
        #[arg(short, long)]
        release: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },
}
