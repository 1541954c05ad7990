//! Categorical field normalization.
//!
//! Source files do not agree on the case of code values (`Female`, `FEMALE`,
//! `female`) while the IG value sets compare case-insensitively. Every field in
//! [`NORMALIZATION_RULES`] that a resource declares in its schema is lowercased
//! before validation; undeclared fields are never touched.

use serde::{Deserialize, Serialize};

use crate::error::CsvResult;
use crate::models::{PackageDescriptor, ResourceDescriptor};
use crate::parser::{read_table, Table};

/// Cell transform applied by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    Lowercase,
}

impl Transform {
    pub fn apply(&self, value: &str) -> String {
        match self {
            Transform::Lowercase => value.to_lowercase(),
        }
    }
}

/// Field name bound to the transform applied to its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizationRule {
    pub field: &'static str,
    pub transform: Transform,
}

const fn lowercase(field: &'static str) -> NormalizationRule {
    NormalizationRule {
        field,
        transform: Transform::Lowercase,
    }
}

/// Categorical code fields of the admin, screening and demographic extracts.
pub const NORMALIZATION_RULES: &[NormalizationRule] = &[
    lowercase("ORGANIZATION_TYPE"),
    lowercase("FACILITY_STATE"),
    lowercase("ENCOUNTER_CLASS_CODE"),
    lowercase("ENCOUNTER_CLASS_CODE_DESCRIPTION"),
    lowercase("ENCOUNTER_STATUS_CODE"),
    lowercase("ENCOUNTER_STATUS_CODE_DESCRIPTION"),
    lowercase("ENCOUNTER_TYPE_CODE_DESCRIPTION"),
    lowercase("SCREENING_STATUS_CODE"),
    lowercase("SCREENING_CODE_DESCRIPTION"),
    lowercase("QUESTION_CODE_DESCRIPTION"),
    lowercase("UCUM_UNITS"),
    lowercase("SDOH_DOMAIN"),
    lowercase("ANSWER_CODE"),
    lowercase("ANSWER_CODE_DESCRIPTION"),
    lowercase("GENDER"),
    lowercase("SEX_AT_BIRTH_CODE"),
    lowercase("SEX_AT_BIRTH_CODE_DESCRIPTION"),
    lowercase("SEX_AT_BIRTH_CODE_SYSTEM"),
    lowercase("RELATIONSHIP_PERSON_CODE"),
    lowercase("RELATIONSHIP_PERSON_DESCRIPTION"),
    lowercase("STATE"),
    lowercase("GENDER_IDENTITY_CODE"),
    lowercase("GENDER_IDENTITY_CODE_DESCRIPTION"),
    lowercase("GENDER_IDENTITY_CODE_SYSTEM_NAME"),
    lowercase("SEXUAL_ORIENTATION_CODE"),
    lowercase("SEXUAL_ORIENTATION_CODE_DESCRIPTION"),
    lowercase("PREFERRED_LANGUAGE_CODE"),
    lowercase("PREFERRED_LANGUAGE_CODE_DESCRIPTION"),
    lowercase("PREFERRED_LANGUAGE_CODE_SYSTEM_NAME"),
    lowercase("RACE_CODE_DESCRIPTION"),
    lowercase("ETHNICITY_CODE_DESCRIPTION"),
    lowercase("ETHNICITY_CODE_SYSTEM_NAME"),
];

/// A rule matched to a schema field position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedRule {
    /// Zero-based position of the field in the schema
    pub position: usize,
    pub rule: NormalizationRule,
}

/// Rules whose field is declared in `field_names`, in schema order.
pub fn applicable_rules(field_names: &[&str], rules: &[NormalizationRule]) -> Vec<AppliedRule> {
    field_names
        .iter()
        .enumerate()
        .filter_map(|(position, name)| {
            rules
                .iter()
                .find(|rule| rule.field == *name)
                .map(|rule| AppliedRule { position, rule: *rule })
        })
        .collect()
}

/// Apply the rules to the table columns at the schema positions.
///
/// Cells equal to one of `missing_values` are left as written so they stay
/// recognisable as missing. Returns the names of the normalized fields.
pub fn normalize_table(
    table: &mut Table,
    field_names: &[&str],
    missing_values: &[String],
    rules: &[NormalizationRule],
) -> Vec<String> {
    let applied = applicable_rules(field_names, rules);

    for row in &mut table.rows {
        for step in &applied {
            if let Some(cell) = row.cells.get_mut(step.position) {
                if !missing_values.contains(cell) {
                    *cell = step.rule.transform.apply(cell);
                }
            }
        }
    }

    applied.iter().map(|step| step.rule.field.to_string()).collect()
}

/// A resource whose table has been loaded and normalized.
#[derive(Debug, Clone)]
pub struct NormalizedResource {
    pub descriptor: ResourceDescriptor,
    pub table: Table,
    pub normalized_fields: Vec<String>,
}

impl NormalizedResource {
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }
}

/// The package after normalization; input of the validation engine.
#[derive(Debug, Clone)]
pub struct NormalizedPackage {
    pub name: String,
    pub resources: Vec<NormalizedResource>,
}

/// Load one resource's table and normalize it.
pub fn normalize_resource(
    descriptor: ResourceDescriptor,
    rules: &[NormalizationRule],
) -> CsvResult<NormalizedResource> {
    let mut table = read_table(&descriptor.path, descriptor.resource.delimiter())?;
    let normalized_fields = {
        let field_names = descriptor.resource.field_names();
        let missing_values = descriptor.resource.missing_values();
        normalize_table(&mut table, &field_names, &missing_values, rules)
    };

    tracing::debug!(
        resource = %descriptor.name(),
        fields = ?normalized_fields,
        "normalized categorical fields"
    );

    Ok(NormalizedResource {
        descriptor,
        table,
        normalized_fields,
    })
}

/// Load and normalize every resource of the package.
pub fn normalize_package(
    package: PackageDescriptor,
    rules: &[NormalizationRule],
) -> CsvResult<NormalizedPackage> {
    let resources = package
        .resources
        .into_iter()
        .map(|descriptor| normalize_resource(descriptor, rules))
        .collect::<CsvResult<Vec<_>>>()?;

    Ok(NormalizedPackage {
        name: package.name,
        resources,
    })
}
