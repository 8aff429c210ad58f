//! Field resolver: the exhaustive `FieldRule` dispatch that
//! replaces dynamic string-keyed rule dispatch with a typed match.

mod formula;
mod material;

use std::collections::HashMap;

use crate::config::{ResolvedMaterialMap, VdsGrammar};
use crate::error::DataError;
use crate::model::{DecodedVds, FieldDefinition, FieldRule, PipingClassRow, PmsColumn, Traceability, VdsAttribute, VdsIndexColumn, VdsIndexRow};
use crate::repositories::StandardsRepository;

/// Everything a single field's rule might need. Borrowed for the duration of
/// one `generate` call; nothing here is mutated.
pub struct ResolveContext<'a> {
    pub grammar: &'a VdsGrammar,
    pub decoded: &'a DecodedVds,
    pub pms_row: &'a PipingClassRow,
    pub vds_index_row: Option<&'a VdsIndexRow>,
    pub standards: &'a StandardsRepository,
    pub material_maps: &'a HashMap<String, ResolvedMaterialMap>,
}

/// Resolve one field definition to its value and traceability record, or a
/// `DataError` the assembler folds into the datasheet's validation summary.
pub fn resolve_field(def: &FieldDefinition, ctx: &ResolveContext) -> Result<(String, Traceability), DataError> {
    match &def.rule {
        FieldRule::Vds(attr) => resolve_vds_attribute(def, *attr, ctx),
        FieldRule::Pms(column) => resolve_pms_column(def, *column, ctx),
        FieldRule::Standard { fallback } => resolve_standard(def, fallback.as_deref(), ctx),
        FieldRule::PmsAndStandard(component) => resolve_material_component(def, *component, ctx),
        FieldRule::VdsIndex(column) => resolve_vds_index_column(def, column, ctx),
        FieldRule::Calculated(formula) => {
            let value = formula::evaluate(&def.field_name, formula, ctx.pms_row.design_pressure_max)?;
            Ok((
                value,
                Traceability {
                    source_kind: def.rule.kind_name().to_string(),
                    source_document: "calculated".to_string(),
                    source_value: ctx.pms_row.design_pressure_max.map(|v| v.to_string()),
                    derivation_rule: formula::describe(formula),
                    clause_reference: None,
                    confidence: 1.0,
                    notes: None,
                },
            ))
        }
        FieldRule::Fixed(value) => Ok((
            value.clone(),
            Traceability {
                source_kind: def.rule.kind_name().to_string(),
                source_document: "configuration".to_string(),
                source_value: Some(value.clone()),
                derivation_rule: "FIXED".to_string(),
                clause_reference: None,
                confidence: 1.0,
                notes: None,
            },
        )),
    }
}

fn resolve_vds_attribute(
    def: &FieldDefinition,
    attr: VdsAttribute,
    ctx: &ResolveContext,
) -> Result<(String, Traceability), DataError> {
    let decoded = ctx.decoded;
    let value = match attr {
        VdsAttribute::VdsNo => decoded.raw.clone(),
        VdsAttribute::PipingClass => decoded.piping_class.clone(),
        VdsAttribute::EndConnections => ctx
            .grammar
            .end_connections
            .get(&decoded.end_connection)
            .cloned()
            .ok_or_else(|| DataError::MissingOperand {
                field: def.field_name.clone(),
                detail: format!("no display name configured for end connection '{}'", decoded.end_connection),
            })?,
        VdsAttribute::ValveType => {
            let prefix_name = ctx
                .grammar
                .prefixes
                .get(&decoded.valve_type_prefix)
                .map(|p| p.valve_type_name.as_str())
                .ok_or_else(|| DataError::MissingOperand {
                    field: def.field_name.clone(),
                    detail: format!("no prefix rule for '{}'", decoded.valve_type_prefix),
                })?;
            let bore_name = ctx
                .grammar
                .bore_types
                .get(&decoded.bore_type)
                .map(String::as_str)
                .ok_or_else(|| DataError::MissingOperand {
                    field: def.field_name.clone(),
                    detail: format!("no bore-type name for '{}'", decoded.bore_type),
                })?;
            format!("{prefix_name}, {bore_name}")
        }
        VdsAttribute::IsNaceCompliant => decoded.is_nace_compliant.to_string(),
        VdsAttribute::IsLowTemp => decoded.is_low_temp.to_string(),
        VdsAttribute::IsMetalSeated => decoded.is_metal_seated.to_string(),
        VdsAttribute::PrimaryStandard => decoded.primary_standard.clone(),
        VdsAttribute::SourService => {
            if decoded.is_nace_compliant {
                ctx.grammar.source_service.nace_text.clone()
            } else {
                ctx.grammar.source_service.dash_text.clone()
            }
        }
    };
    Ok((
        value,
        Traceability {
            source_kind: def.rule.kind_name().to_string(),
            source_document: "VDS code".to_string(),
            source_value: Some(decoded.raw.clone()),
            derivation_rule: format!("VDS: {}", attr_name(attr)),
            clause_reference: None,
            confidence: 1.0,
            notes: None,
        },
    ))
}

fn attr_name(attr: VdsAttribute) -> &'static str {
    attr.into()
}

fn resolve_pms_column(
    def: &FieldDefinition,
    column: PmsColumn,
    ctx: &ResolveContext,
) -> Result<(String, Traceability), DataError> {
    let row = ctx.pms_row;
    let value = match column {
        PmsColumn::PressureClass => {
            let numeric = crate::repositories::pressure_rating_numeric(&row.pressure_rating).ok_or_else(|| {
                DataError::MissingOperand {
                    field: def.field_name.clone(),
                    detail: format!("pressureRating '{}' has no numeric form", row.pressure_rating),
                }
            })?;
            format!("ASME B16.34 Class {numeric}")
        }
        PmsColumn::CorrosionAllowance => row.corrosion_allowance.clone(),
        PmsColumn::Service => row.service.clone(),
        PmsColumn::BaseMaterial => row.base_material.clone(),
        PmsColumn::MaterialGroup => row.material_group.clone(),
        PmsColumn::DesignTempMin => row.design_temp_min.clone(),
        PmsColumn::DesignTempMax => row.design_temp_max.clone(),
        PmsColumn::DesignPressure => {
            let pressure = row.design_pressure_max.ok_or_else(|| DataError::MissingOperand {
                field: def.field_name.clone(),
                detail: "designPressureMax is absent for this piping class".to_string(),
            })?;
            format!("{pressure:.1} barg @ {}°C", row.design_temp_max)
        }
    };
    let column_name: &'static str = column.into();
    Ok((
        value,
        Traceability {
            source_kind: def.rule.kind_name().to_string(),
            source_document: format!("piping class {}", row.class),
            source_value: Some(row.class.clone()),
            derivation_rule: format!("PMS: {column_name}"),
            clause_reference: None,
            confidence: 1.0,
            notes: None,
        },
    ))
}

fn resolve_standard(
    def: &FieldDefinition,
    fallback: Option<&str>,
    ctx: &ResolveContext,
) -> Result<(String, Traceability), DataError> {
    let valve_type = &ctx.decoded.valve_type_prefix;
    if let Some((clause, text)) = ctx.standards.value_for_field(&def.field_name, valve_type) {
        return Ok((
            text,
            Traceability {
                source_kind: def.rule.kind_name().to_string(),
                source_document: clause.standard.clone(),
                source_value: Some(clause.clause.clone()),
                derivation_rule: "STANDARD".to_string(),
                clause_reference: Some(format!("{} §{} cl.{} p.{}", clause.standard, clause.section, clause.clause, clause.page)),
                confidence: 1.0,
                notes: None,
            },
        ));
    }
    match fallback {
        Some(text) => Ok((
            text.to_string(),
            Traceability {
                source_kind: def.rule.kind_name().to_string(),
                source_document: "configuration fallback".to_string(),
                source_value: None,
                derivation_rule: "STANDARD: fallback".to_string(),
                clause_reference: None,
                confidence: 0.5,
                notes: Some("no mandatory clause matched this field and valve type".to_string()),
            },
        )),
        None => Err(DataError::MissingOperand {
            field: def.field_name.clone(),
            detail: format!("no mandatory standard clause found for valve type '{valve_type}'"),
        }),
    }
}

fn resolve_material_component(
    def: &FieldDefinition,
    component: crate::model::MaterialComponent,
    ctx: &ResolveContext,
) -> Result<(String, Traceability), DataError> {
    let representative_size_in = ctx.vds_index_row.and_then(|r| r.representative_size_in);
    let value = material::resolve_material(
        &def.field_name,
        component,
        &ctx.pms_row.base_material,
        ctx.decoded,
        representative_size_in,
        ctx.material_maps,
    )?;
    Ok((
        value,
        Traceability {
            source_kind: def.rule.kind_name().to_string(),
            source_document: format!("material map ({})", ctx.pms_row.base_material),
            source_value: Some(ctx.pms_row.base_material.clone()),
            derivation_rule: format!(
                "Material lookup: base={}, nace={}, lowTemp={}",
                ctx.pms_row.base_material, ctx.decoded.is_nace_compliant, ctx.decoded.is_low_temp
            ),
            clause_reference: None,
            confidence: 1.0,
            notes: None,
        },
    ))
}

fn resolve_vds_index_column(
    def: &FieldDefinition,
    column: &VdsIndexColumn,
    ctx: &ResolveContext,
) -> Result<(String, Traceability), DataError> {
    let row = ctx.vds_index_row.ok_or_else(|| DataError::MissingIndexRow {
        field: def.field_name.clone(),
        vds: ctx.decoded.raw.clone(),
    })?;
    let value = match column {
        VdsIndexColumn::SizeRange => Some(row.size_range.clone()),
        VdsIndexColumn::BallMaterial => row.ball_material.clone(),
        VdsIndexColumn::SeatMaterial => row.seat_material.clone(),
        VdsIndexColumn::StemMaterial => row.stem_material.clone(),
        VdsIndexColumn::TrimMaterial => row.trim_material.clone(),
    }
    .ok_or_else(|| DataError::MissingOperand {
        field: def.field_name.clone(),
        detail: format!("{column:?} is absent in the VDS index row for '{}'", row.vds),
    })?;
    Ok((
        value,
        Traceability {
            source_kind: def.rule.kind_name().to_string(),
            source_document: format!("VDS index ({})", row.vds),
            source_value: Some(row.vds.clone()),
            derivation_rule: format!("VDS_INDEX: {column:?}"),
            clause_reference: None,
            confidence: 1.0,
            notes: None,
        },
    ))
}
