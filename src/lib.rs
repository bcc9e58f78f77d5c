// src/lib.rs

//! rpmweave
//!
//! Turns a declarative package descriptor into a populated RPM build root and
//! a spec file, then optionally drives `rpmbuild`.
//!
//! # Architecture
//!
//! - Descriptor: TOML parsed and validated once, immutable afterwards
//! - Version: project version to RPM version/release
//! - Macros: `%{name}` expansion with a per-run cache
//! - Select: artifacts, dependencies and platform applicability
//! - Install: copy into the staging root, queue soft links, plan link commands
//! - Spec: compose the spec text from the descriptor and the install report
//! - Rpmbuild: work area layout, `rpmbuild` and `rpmsign`

pub mod descriptor;
mod error;
pub mod filter;
pub mod install;
pub mod macros;
pub mod pipeline;
pub mod process;
pub mod rpmbuild;
pub mod scan;
pub mod select;
pub mod spec;
pub mod version;

pub use descriptor::{Mapping, PackageDescriptor, PackageManifest, Source};
pub use error::{Error, Result};
pub use install::{FileInstaller, InstallReport, LinkPlan, LinkPlanner};
pub use macros::MacroEvaluator;
pub use pipeline::Pipeline;
pub use spec::SpecComposer;
pub use version::VersionSpec;
