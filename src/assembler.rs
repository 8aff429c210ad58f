//! Datasheet assembly: groups resolved fields into sections,
//! computes completion and validation status, and folds `DataError`s into
//! `validationErrors`/`warnings` instead of aborting generation.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{Config, CrossConsistencyRule};
use crate::model::{
    Completion, Datasheet, DatasheetMetadata, DatasheetSection, FieldValidationStatus, ResolvedField, Traceability,
    ValidationStatus,
};
use crate::resolver::{self, ResolveContext};

/// The first signed decimal number in a formatted field value, e.g. `300` out
/// of `"ASME B16.34 Class 300"` or `19.6` out of `"19.6 barg @ 38°C"`. Fixed
/// pattern, not derived from config, so a process-wide `Lazy` is safe here.
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());

fn first_number(value: &str) -> Option<f64> {
    NUMBER_RE.find(value)?.as_str().parse().ok()
}

pub fn assemble(config: &Config, ctx: &ResolveContext) -> Datasheet {
    let mut validation_errors = Vec::new();
    let mut warnings = Vec::new();
    let mut total = 0usize;
    let mut populated = 0usize;

    let mut sections: Vec<DatasheetSection> = config
        .field_mappings
        .sections
        .iter()
        .map(|name| DatasheetSection {
            name: name.clone(),
            fields: Vec::new(),
        })
        .collect();

    for def in &config.field_mappings.fields {
        total += 1;
        let resolved = match resolver::resolve_field(def, ctx) {
            Ok((value, traceability)) => {
                populated += 1;
                ResolvedField {
                    field_name: def.field_name.clone(),
                    display_name: def.display_name.clone(),
                    section: def.section.clone(),
                    value: Some(value),
                    is_required: def.required,
                    is_populated: true,
                    validation_status: FieldValidationStatus::Ok,
                    traceability,
                }
            }
            Err(err) => {
                // `DataError`'s `Display` already names the field.
                let message = err.to_string();
                let status = if def.required {
                    validation_errors.push(message);
                    FieldValidationStatus::MissingRequired
                } else {
                    warnings.push(message);
                    FieldValidationStatus::Warning
                };
                ResolvedField {
                    field_name: def.field_name.clone(),
                    display_name: def.display_name.clone(),
                    section: def.section.clone(),
                    value: None,
                    is_required: def.required,
                    is_populated: false,
                    validation_status: status,
                    traceability: Traceability {
                        source_kind: def.rule.kind_name().to_string(),
                        derivation_rule: err.to_string(),
                        confidence: 0.0,
                        ..Traceability::default()
                    },
                }
            }
        };

        if let Some(section) = sections.iter_mut().find(|s| s.name == def.section) {
            section.fields.push(resolved);
        }
    }

    check_cross_consistency(&config.field_mappings.cross_consistency, &sections, &mut warnings);

    let validation_status = if !validation_errors.is_empty() {
        ValidationStatus::Invalid
    } else if !warnings.is_empty() {
        ValidationStatus::Warnings
    } else {
        ValidationStatus::Valid
    };

    let percentage = if total == 0 {
        0.0
    } else {
        (populated as f64 / total as f64) * 100.0
    };

    let metadata = DatasheetMetadata {
        generated_at: Utc::now().to_rfc3339(),
        generation_version: env!("CARGO_PKG_VERSION").to_string(),
        vds_no: ctx.decoded.raw.clone(),
        completion: Completion {
            populated,
            total,
            percentage,
        },
        validation_status,
        validation_errors,
        warnings,
    };

    Datasheet { metadata, sections }
}

fn field_value<'a>(sections: &'a [DatasheetSection], field_name: &str) -> Option<&'a str> {
    sections
        .iter()
        .flat_map(|s| &s.fields)
        .find(|f| f.field_name == field_name)
        .and_then(|f| f.value.as_deref())
}

/// For each configured pair, compare the first numeric token of both
/// resolved values; a ratio over `max_ratio` adds a warning rather than
/// failing the datasheet. Fields that failed to resolve, or whose value
/// carries no numeric token, are skipped — that mismatch is already
/// reported by the required/optional field-level check.
fn check_cross_consistency(rules: &[CrossConsistencyRule], sections: &[DatasheetSection], warnings: &mut Vec<String>) {
    for rule in rules {
        let (Some(a), Some(b)) = (field_value(sections, &rule.field_a), field_value(sections, &rule.field_b)) else {
            continue;
        };
        let (Some(a_num), Some(b_num)) = (first_number(a), first_number(b)) else {
            continue;
        };
        if a_num == 0.0 {
            continue;
        }
        let ratio = b_num / a_num;
        if ratio > rule.max_ratio {
            warnings.push(format!(
                "{}/{}: cross-consistency check failed (ratio {ratio:.3} exceeds configured maximum {})",
                rule.field_a, rule.field_b, rule.max_ratio
            ));
        }
    }
}
