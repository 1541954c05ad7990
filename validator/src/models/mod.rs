//! Domain models for the validation pipeline.
//!
//! - [`Specification`] / [`ResourceSchema`] - the declared resources
//! - [`Resolution`] / [`FileMapping`] - where each logical resource lives on disk
//! - [`ResourceDescriptor`] / [`PackageDescriptor`] - schemas joined with paths
//!
//! Resource schemas are kept as raw JSON: their interpretation belongs to the
//! validation engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

// =============================================================================
// Specification
// =============================================================================

/// One resource entry of the specification document.
///
/// Keys other than `name` and `schema` (`title`, `dialect`, ...) are kept in
/// `extra` and carried into the package descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceSchema {
    pub name: String,
    pub schema: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceSchema {
    /// Field names declared in `schema.fields`, in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.schema
            .get("fields")
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(|field| field.get("name").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Declared `schema.missingValues`; `[""]` when absent.
    pub fn missing_values(&self) -> Vec<String> {
        match self.schema.get("missingValues").and_then(Value::as_array) {
            Some(values) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => vec![String::new()],
        }
    }

    /// Explicit `dialect.delimiter`, if the entry declares one.
    pub fn delimiter(&self) -> Option<char> {
        let raw = self.extra.get("dialect")?.get("delimiter")?.as_str()?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

/// The specification document: an ordered list of resource schemas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Specification {
    pub resources: Vec<ResourceSchema>,
}

impl Specification {
    pub fn resource(&self, name: &str) -> Option<&ResourceSchema> {
        self.resources.iter().find(|r| r.name == name)
    }
}

// =============================================================================
// File resolution
// =============================================================================

/// Outcome of looking up one logical resource in the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(PathBuf),
    NotFound,
}

impl Resolution {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Resolution::Found(path) => Some(path),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// Logical resource name to [`Resolution`], in prefix-table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMapping {
    entries: Vec<(String, Resolution)>,
}

impl FileMapping {
    pub fn new(entries: Vec<(String, Resolution)>) -> Self {
        Self { entries }
    }

    /// `None` both for unknown names and for known but unresolved ones.
    pub fn path(&self, name: &str) -> Option<&Path> {
        self.resolution(name).and_then(Resolution::path)
    }

    pub fn resolution(&self, name: &str) -> Option<&Resolution> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, resolution)| resolution)
    }

    /// Names without a matching file, in table order.
    pub fn unresolved(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, resolution)| !resolution.is_found())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(|(_, resolution)| resolution.is_found())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resolution)> {
        self.entries.iter().map(|(name, resolution)| (name.as_str(), resolution))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Package descriptor
// =============================================================================

/// A resource schema joined with its resolved file.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResourceDescriptor {
    #[serde(flatten)]
    pub resource: ResourceSchema,
    pub path: PathBuf,
}

impl ResourceDescriptor {
    pub fn name(&self) -> &str {
        &self.resource.name
    }
}

/// All resources of one run, ready for normalization and validation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PackageDescriptor {
    pub name: String,
    pub resources: Vec<ResourceDescriptor>,
}
