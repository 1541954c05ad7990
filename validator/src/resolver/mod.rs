//! Resource file resolution.
//!
//! Finds, for every logical resource, a file in the data directory whose name
//! starts with the resource's prefix and ends with the CSV extension. A resource
//! without a match is recorded as [`Resolution::NotFound`]; the caller decides
//! what that means.
//!
//! When several files match, the lexicographically smallest file name wins, so
//! the choice does not depend on directory listing order.

use std::fs;
use std::path::Path;

use crate::config::ResourceBinding;
use crate::models::{FileMapping, Resolution};

/// Regular files in `dir` carrying `.{extension}`, sorted by name.
pub fn list_candidates(dir: &Path, extension: &str) -> std::io::Result<Vec<String>> {
    let suffix = format!(".{}", extension);
    let mut names = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            tracing::debug!(path = %entry.path().display(), "skipping non UTF-8 file name");
            continue;
        };
        if name.ends_with(&suffix) && entry.path().is_file() {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}

/// First candidate (in sorted order) starting with `prefix`.
pub fn select_match<'a>(candidates: &'a [String], prefix: &str) -> Option<&'a str> {
    candidates
        .iter()
        .map(String::as_str)
        .find(|name| name.starts_with(prefix))
}

/// Look up a single prefix in `dir`.
pub fn find_file(dir: &Path, prefix: &str, extension: &str) -> std::io::Result<Resolution> {
    let candidates = list_candidates(dir, extension)?;
    Ok(match select_match(&candidates, prefix) {
        Some(name) => Resolution::Found(dir.join(name)),
        None => Resolution::NotFound,
    })
}

/// Resolve every binding against one directory listing.
pub fn resolve_files(
    dir: &Path,
    bindings: &[ResourceBinding],
    extension: &str,
) -> std::io::Result<FileMapping> {
    let candidates = list_candidates(dir, extension)?;

    let entries = bindings
        .iter()
        .map(|binding| {
            let resolution = match select_match(&candidates, &binding.prefix) {
                Some(name) => Resolution::Found(dir.join(name)),
                None => Resolution::NotFound,
            };
            match &resolution {
                Resolution::Found(path) => tracing::debug!(
                    resource = %binding.name,
                    path = %path.display(),
                    "resolved resource file"
                ),
                Resolution::NotFound => tracing::debug!(
                    resource = %binding.name,
                    prefix = %binding.prefix,
                    "no file matches prefix"
                ),
            }
            (binding.name.clone(), resolution)
        })
        .collect();

    Ok(FileMapping::new(entries))
}
