//! Package descriptor assembly.
//!
//! Joins every resource of the specification with its resolved file. This is
//! where an unresolved resource stops being data and becomes
//! [`PipelineError::ResourceFileNotFound`].

use crate::error::{PipelineError, PipelineResult};
use crate::models::{FileMapping, PackageDescriptor, ResourceDescriptor, Specification};

/// Build the package descriptor for one run.
///
/// Fails on the first resource (in specification order) without a resolved
/// path, including names that are not in the prefix table at all.
pub fn build_package(
    specification: &Specification,
    mapping: &FileMapping,
    package_name: &str,
) -> PipelineResult<PackageDescriptor> {
    let mut resources = Vec::with_capacity(specification.resources.len());

    for resource in &specification.resources {
        let path = mapping
            .path(&resource.name)
            .ok_or_else(|| PipelineError::ResourceFileNotFound {
                resource: resource.name.clone(),
            })?;

        let mut resource = resource.clone();
        // the resolved path replaces any path carried by the specification
        resource.extra.remove("path");

        resources.push(ResourceDescriptor {
            resource,
            path: path.to_path_buf(),
        });
    }

    Ok(PackageDescriptor {
        name: package_name.to_string(),
        resources,
    })
}
