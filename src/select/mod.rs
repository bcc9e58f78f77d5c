// src/select/mod.rs

//! Source selection: which artifacts, dependencies and sources apply
//!
//! - [`ArtifactSelector`] picks from the build's own artifacts
//! - [`DependencySelector`] filters transitive dependencies by coordinate pattern
//! - [`platform_matches`] decides whether a source applies to the target
//!   architecture and OS

mod artifact;
mod dependency;
mod platform;

pub use artifact::{Artifact, ArtifactProvider, ArtifactSelector, StaticArtifacts};
pub use dependency::{CoordinatePattern, DependencySelector};
pub use platform::{NOARCH, PlatformFilter, TargetPlatform, host_arch, platform_matches};
