// src/spec/files.rs

//! `%files` entries
//!
//! A mapping whose staged directory holds exactly what the mapping put there,
//! copied from complete source trees, is listed as the directory itself.
//! Anything else is enumerated file by file, so that the package never claims
//! files another mapping owns.

use crate::descriptor::{FileDefaults, Mapping};
use crate::error::Result;
use crate::install::{MappingOutcome, normalize_directory};
use crate::scan::DirectoryScanner;
use std::path::Path;

/// `%files` lines for one mapping
pub fn mapping_entries(
    mapping: &Mapping,
    outcome: &MappingOutcome,
    staging: &Path,
    defaults: &FileDefaults,
) -> Result<Vec<String>> {
    let attr = mapping.attr_string(defaults);
    let dest = outcome.directory.trim_end_matches('/');
    let materialized = &outcome.files;
    let linked = &outcome.links;

    if outcome.replaced {
        return Ok(vec![entry(&attr, dest)]);
    }

    if materialized.is_empty() && !linked.is_empty() {
        return Ok(linked.iter().map(|l| entry(&attr, &join(dest, l))).collect());
    }

    if linked.is_empty()
        && mapping.directory_included
        && !mapping.recurse_directories
        && materialized.is_empty()
    {
        return Ok(vec![entry(&attr, dest)]);
    }

    let scan = DirectoryScanner::new(&staging.join(normalize_directory(dest)))
        .with_literal_includes(materialized)?
        .scan()?;

    if scan.everything_included
        && !outcome.partial
        && linked.is_empty()
        && mapping.directory_included
        && !mapping.recurse_directories
    {
        return Ok(vec![entry(&attr, dest)]);
    }

    let mut lines: Vec<String> = scan
        .files
        .iter()
        .map(|f| entry(&attr, &join(dest, f)))
        .collect();

    if mapping.recurse_directories {
        let dir_attr = directory_attr(&attr);
        if mapping.directory_included {
            lines.push(entry(&dir_attr, dest));
        }
        lines.extend(scan.directories.iter().map(|d| entry(&dir_attr, &join(dest, d))));
    }

    lines.extend(linked.iter().map(|l| entry(&attr, &join(dest, l))));
    Ok(lines)
}

/// `attr "path"`, or just the quoted path when there are no attributes
pub fn entry(attr: &str, path: &str) -> String {
    if attr.is_empty() {
        format!("\"{}\"", path)
    } else {
        format!("{} \"{}\"", attr, path)
    }
}

fn join(dest: &str, rel: &str) -> String {
    format!("{}/{}", dest, rel)
}

fn directory_attr(attr: &str) -> String {
    if attr.split(' ').any(|t| t == "%dir") {
        attr.to_string()
    } else if attr.is_empty() {
        "%dir".to_string()
    } else {
        format!("%dir {}", attr)
    }
}
