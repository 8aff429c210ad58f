//! Core data model: decoded VDS codes, source-table rows, the output schema,
//! and the resolved/assembled datasheet.
//!
//! Types here are plain values — no behavior beyond small accessors. The
//! logic that produces them lives in `decoder`, `resolver`, and `assembler`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

/// A VDS code decomposed into its grammar segments. Immutable once produced;
/// `raw` can always be reconstructed losslessly from the segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedVds {
    pub raw: String,
    pub valve_type_prefix: String,
    pub bore_type: char,
    pub piping_class: String,
    pub end_connection: char,
    pub is_nace_compliant: bool,
    pub is_low_temp: bool,
    pub is_metal_seated: bool,
    pub primary_standard: String,
}

/// One row of the piping material specification, keyed by piping class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipingClassRow {
    pub class: String,
    pub pressure_rating: String,
    pub base_material: String,
    pub material_group: String,
    pub corrosion_allowance: String,
    pub service: String,
    /// barg, parsed from the sheet; absent for classes with no tabulated value.
    pub design_pressure_max: Option<f64>,
    pub design_temp_min: String,
    pub design_temp_max: String,
    pub is_nace_class: bool,
    pub is_low_temp_class: bool,
}

/// A pre-computed row keyed by a full VDS code, for values that cannot be
/// derived from rules alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VdsIndexRow {
    pub vds: String,
    pub size_range: String,
    pub ball_material: Option<String>,
    pub seat_material: Option<String>,
    pub stem_material: Option<String>,
    pub trim_material: Option<String>,
    /// Representative nominal size in inches, used by the body material-size
    /// threshold branch. `None` when the code has no single representative
    /// size (e.g. it spans a range) — callers fall back to emitting both.
    pub representative_size_in: Option<f64>,
}

/// The rule type of a standard clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClauseRuleType {
    Mandatory,
    Recommendation,
    Informational,
    Formula,
    Definition,
}

/// A single clause extracted from an engineering standard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardClause {
    pub standard: String,
    pub section: String,
    pub clause: String,
    pub title: String,
    pub text: String,
    pub page: u32,
    pub rule_type: ClauseRuleType,
    pub applies_to: Vec<String>,
    pub datasheet_field: Option<String>,
}

/// A single material component's value, or a branch keyed by end-connection
/// type / size threshold. Config-time representation (`MaterialMap`) still
/// carries `inherits`; `ResolvedMaterialMap` (post config-load merge) never
/// does — see `config::ResolvedMaterialMap`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaterialEntry {
    /// A flat spec string, e.g. `"ASTM A193 Gr. B7"`.
    Flat(String),
    /// Sub-mapping keyed by end-connection letter, e.g. gaskets.
    ByEndConnection(BTreeMap<String, String>),
    /// Sub-mapping keyed by a size threshold, e.g. body forged/cast.
    BySize {
        size_threshold: f64,
        forged: String,
        cast: String,
    },
}

/// Raw, config-file shape of a material map: may declare `inherits` and
/// `overrides`. Flattened into a `ResolvedMaterialMap` at config-load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MaterialMap {
    #[serde(default)]
    pub inherits: Option<String>,
    #[serde(default)]
    pub components: BTreeMap<String, MaterialEntry>,
}

/// One attribute of `DecodedVds`, named for a `VDS`-sourced field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum VdsAttribute {
    VdsNo,
    PipingClass,
    EndConnections,
    ValveType,
    IsNaceCompliant,
    IsLowTemp,
    IsMetalSeated,
    PrimaryStandard,
    /// `sourService`: conditional on `isNaceCompliant` via `nace_text`/`dash_text`.
    SourService,
}

/// A single named column read verbatim from the piping class row.
#[derive(Debug, Clone, PartialEq, Eq, EnumString, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum PmsColumn {
    PressureClass,
    CorrosionAllowance,
    Service,
    BaseMaterial,
    MaterialGroup,
    DesignTempMin,
    DesignTempMax,
    /// `"<designPressureMax> barg @ <designTempMax>°C"`.
    DesignPressure,
}

/// The material component named by a `PMS_AND_STANDARD` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum MaterialComponent {
    Bolts,
    Nuts,
    Gaskets,
    Body,
}

/// The one calculated-field formula family currently supported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Formula {
    /// `designPressureMax * factor`, formatted `"<value> barg"` at one decimal.
    DesignPressureTimes { factor: f64 },
}

/// A named column read from the pre-built VDS index row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VdsIndexColumn {
    SizeRange,
    BallMaterial,
    SeatMaterial,
    StemMaterial,
    TrimMaterial,
}

/// The tagged-variant replacement for a bare `sourceKind` string (see
/// "Dynamic field dispatch"). One variant per `sourceKind`, each carrying its
/// own rule payload instead of a generic parameter bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sourceKind", content = "rule")]
pub enum FieldRule {
    #[serde(rename = "VDS")]
    Vds(VdsAttribute),
    #[serde(rename = "PMS")]
    Pms(PmsColumn),
    #[serde(rename = "STANDARD")]
    Standard {
        #[serde(default)]
        fallback: Option<String>,
    },
    #[serde(rename = "PMS_AND_STANDARD")]
    PmsAndStandard(MaterialComponent),
    #[serde(rename = "VDS_INDEX")]
    VdsIndex(VdsIndexColumn),
    #[serde(rename = "CALCULATED")]
    Calculated(Formula),
    #[serde(rename = "FIXED")]
    Fixed(String),
}

impl FieldRule {
    /// The `sourceKind` discriminant, for traceability and docs — never used
    /// for dispatch (that happens via `match` in `resolver`).
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldRule::Vds(_) => "VDS",
            FieldRule::Pms(_) => "PMS",
            FieldRule::Standard { .. } => "STANDARD",
            FieldRule::PmsAndStandard(_) => "PMS_AND_STANDARD",
            FieldRule::VdsIndex(_) => "VDS_INDEX",
            FieldRule::Calculated(_) => "CALCULATED",
            FieldRule::Fixed(_) => "FIXED",
        }
    }
}

/// One entry in the output schema. The ordered sequence of these, as loaded
/// from `field_mappings.yaml`, fully determines the shape and order of every
/// generated datasheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub field_name: String,
    pub display_name: String,
    pub section: String,
    pub required: bool,
    pub rule: FieldRule,
}

/// Per-field source-of-truth record, attached to every `ResolvedField`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Traceability {
    pub source_kind: String,
    pub source_document: String,
    pub source_value: Option<String>,
    pub derivation_rule: String,
    pub clause_reference: Option<String>,
    pub confidence: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FieldValidationStatus {
    Ok,
    MissingRequired,
    Warning,
}

/// One resolved, fully-traced output field. Produced once per generation;
/// never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedField {
    pub field_name: String,
    pub display_name: String,
    pub section: String,
    pub value: Option<String>,
    pub is_required: bool,
    pub is_populated: bool,
    pub validation_status: FieldValidationStatus,
    pub traceability: Traceability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    Warnings,
    Invalid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub populated: usize,
    pub total: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasheetMetadata {
    pub generated_at: String,
    pub generation_version: String,
    pub vds_no: String,
    pub completion: Completion,
    pub validation_status: ValidationStatus,
    pub validation_errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Structured view: sections in schema order, each field carrying full
/// traceability.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Datasheet {
    pub metadata: DatasheetMetadata,
    pub sections: Vec<DatasheetSection>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasheetSection {
    pub name: String,
    pub fields: Vec<ResolvedField>,
}

impl Datasheet {
    /// Flat projection: `fieldName -> value` only, in schema order via an
    /// order-preserving map so JSON key order matches the structured view.
    pub fn flat_view(&self) -> FlatDatasheet {
        let mut fields = Vec::new();
        for section in &self.sections {
            for field in &section.fields {
                fields.push((field.field_name.clone(), field.value.clone()));
            }
        }
        FlatDatasheet {
            vds_no: self.metadata.vds_no.clone(),
            completion: self.metadata.completion.clone(),
            validation_status: self.metadata.validation_status,
            fields,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatDatasheet {
    pub vds_no: String,
    pub completion: Completion,
    pub validation_status: ValidationStatus,
    /// `(fieldName, value)` pairs in schema order — a `Vec` rather than a
    /// `HashMap` so serialization order is deterministic across runs.
    pub fields: Vec<(String, Option<String>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, Serialize, EnumIter)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub vds: String,
    pub status: BatchStatus,
    pub data: Option<Datasheet>,
    pub error: Option<String>,
}
