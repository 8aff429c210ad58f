//! Config loader.
//!
//! Reads three YAML documents — VDS grammar, field-mapping schema, and
//! material-mapping tables — into one immutable `Config`. Material-map
//! inheritance is flattened here, once, so the per-request resolver only
//! does key composition and fallback, never graph traversal (
//! "model as explicit merge-with-overrides... reject cycles at load").

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::model::{FieldDefinition, MaterialEntry, MaterialMap};

#[derive(Debug, Clone, Deserialize)]
pub struct PrefixRule {
    pub valve_type_name: String,
    pub primary_standard: String,
    #[serde(default)]
    pub supports_metal_flag: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourServiceText {
    pub nace_text: String,
    pub dash_text: String,
}

/// The VDS grammar, loaded from `vds_rules.yaml`.
///
/// `class_regex` is compiled once, here, at deserialization time, rather
/// than behind a process-wide lazy cell — each `VdsGrammar` (and so each
/// `Config`/`Engine`) owns its own compiled pattern, so two engines with
/// different `piping_class_pattern`s in the same process never collide.
#[derive(Debug, Clone)]
pub struct VdsGrammar {
    /// Longest-match prefix set, keyed by prefix string.
    pub prefixes: BTreeMap<String, PrefixRule>,
    /// Single-character bore codes to display names.
    pub bore_types: BTreeMap<char, String>,
    /// Regular expression matching a piping class, e.g. `[A-G][0-9]+`.
    pub piping_class_pattern: String,
    /// `piping_class_pattern`, compiled.
    pub class_regex: Regex,
    /// Modifier character to the `DecodedVds` boolean flag it sets.
    pub modifiers: BTreeMap<char, String>,
    /// End-connection character to display name.
    pub end_connections: BTreeMap<char, String>,
    pub source_service: SourServiceText,
}

#[derive(Deserialize)]
struct RawVdsGrammar {
    prefixes: BTreeMap<String, PrefixRule>,
    bore_types: BTreeMap<char, String>,
    piping_class_pattern: String,
    modifiers: BTreeMap<char, String>,
    end_connections: BTreeMap<char, String>,
    source_service: SourServiceText,
}

impl<'de> Deserialize<'de> for VdsGrammar {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawVdsGrammar::deserialize(deserializer)?;
        let class_regex = Regex::new(&raw.piping_class_pattern).map_err(serde::de::Error::custom)?;
        Ok(VdsGrammar {
            prefixes: raw.prefixes,
            bore_types: raw.bore_types,
            piping_class_pattern: raw.piping_class_pattern,
            class_regex,
            modifiers: raw.modifiers,
            end_connections: raw.end_connections,
            source_service: raw.source_service,
        })
    }
}

/// The field-mapping schema, loaded from `field_mappings.yaml`. The ordered
/// set of `fields` is the output schema: it fully determines the
/// shape and order of every generated datasheet.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMappings {
    pub sections: Vec<String>,
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub cross_consistency: Vec<CrossConsistencyRule>,
}

/// A pair of fields whose first numeric token must satisfy a configured
/// ratio; checked by the assembler's validation pass after both fields
/// resolve. `field_b`'s number divided by `field_a`'s must not exceed
/// `max_ratio`, e.g. `pressureClass` ("ASME B16.34 Class 300") vs.
/// `designPressure` ("50.0 barg @ 100°C") catches a design pressure grossly
/// out of line with the nominal pressure class.
#[derive(Debug, Clone, Deserialize)]
pub struct CrossConsistencyRule {
    pub field_a: String,
    pub field_b: String,
    pub max_ratio: f64,
}

/// A material map after single-level `inherits`/`overrides` merge. Never
/// carries `inherits` itself — by construction, not as an invariant that
/// needs re-checking per request.
#[derive(Debug, Clone, Default)]
pub struct ResolvedMaterialMap {
    pub components: BTreeMap<String, MaterialEntry>,
}

/// Fully loaded, validated, immutable configuration. Constructed once at
/// startup and shared (via `Arc`, see `engine::Engine`) across every request
/// — an explicit value injected into repositories and the resolver, never a global singleton.
#[derive(Debug, Clone)]
pub struct Config {
    pub grammar: VdsGrammar,
    pub field_mappings: FieldMappings,
    pub resolved_material_maps: HashMap<String, ResolvedMaterialMap>,
}

impl Config {
    /// Load and validate configuration from a directory containing
    /// `vds_rules.yaml`, `field_mappings.yaml`, and `material_mappings.yaml`.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let grammar: VdsGrammar = read_yaml(&dir.join("vds_rules.yaml"))?;
        let field_mappings: FieldMappings = read_yaml(&dir.join("field_mappings.yaml"))?;
        let raw_material_maps: BTreeMap<String, MaterialMap> =
            read_yaml(&dir.join("material_mappings.yaml"))?;

        let resolved_material_maps = resolve_material_maps(&raw_material_maps)?;

        let config = Config {
            grammar,
            field_mappings,
            resolved_material_maps,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // Every fieldName must be unique.
        let mut seen = HashSet::new();
        for field in &self.field_mappings.fields {
            if !seen.insert(field.field_name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate fieldName '{}'",
                    field.field_name
                )));
            }
        }

        // The set of section names in the schema must equal the set of
        // sections the assembler emits.
        let declared: HashSet<&str> = self.field_mappings.sections.iter().map(String::as_str).collect();
        let used: HashSet<&str> = self
            .field_mappings
            .fields
            .iter()
            .map(|f| f.section.as_str())
            .collect();
        for rule in &self.field_mappings.cross_consistency {
            if !seen.contains(rule.field_a.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "cross_consistency rule references unknown field '{}'",
                    rule.field_a
                )));
            }
            if !seen.contains(rule.field_b.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "cross_consistency rule references unknown field '{}'",
                    rule.field_b
                )));
            }
        }

        if declared != used {
            return Err(ConfigError::Validation(format!(
                "declared sections {:?} do not match sections used by fields {:?}",
                declared, used
            )));
        }

        if self.grammar.prefixes.is_empty() {
            return Err(ConfigError::Validation(
                "vds_rules.yaml: prefixes must not be empty".to_string(),
            ));
        }
        if self.grammar.bore_types.is_empty() {
            return Err(ConfigError::Validation(
                "vds_rules.yaml: bore_types must not be empty".to_string(),
            ));
        }

        // Material components referenced by fields but undefined in any
        // material map are a warning, not a fatal error.
        for field in &self.field_mappings.fields {
            if let crate::model::FieldRule::PmsAndStandard(component) = &field.rule {
                let name: &'static str = component.into();
                let any_defines_it = self
                    .resolved_material_maps
                    .values()
                    .any(|m| m.components.contains_key(&name.to_lowercase()));
                if !any_defines_it {
                    tracing::warn!(
                        field = %field.field_name,
                        component = name,
                        "material component referenced by field is not defined in any material map"
                    );
                }
            }
        }

        Ok(())
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Flatten `inherits`/`overrides` into fully-resolved maps, rejecting cycles
/// and multi-level chains (inheritance is single-level only).
fn resolve_material_maps(
    raw: &BTreeMap<String, MaterialMap>,
) -> Result<HashMap<String, ResolvedMaterialMap>, ConfigError> {
    let mut resolved = HashMap::new();
    for (key, map) in raw {
        let components = match &map.inherits {
            None => map.components.clone(),
            Some(base_key) => {
                if base_key == key {
                    return Err(ConfigError::Validation(format!(
                        "material map '{key}' inherits from itself"
                    )));
                }
                let base = raw.get(base_key).ok_or_else(|| {
                    ConfigError::Validation(format!(
                        "material map '{key}' inherits from unknown base '{base_key}'"
                    ))
                })?;
                if base.inherits.is_some() {
                    return Err(ConfigError::Validation(format!(
                        "material map '{key}' inherits from '{base_key}', which itself \
                         inherits — only single-level inheritance is supported"
                    )));
                }
                let mut merged = base.components.clone();
                for (comp_key, comp_val) in &map.components {
                    merged.insert(comp_key.clone(), comp_val.clone());
                }
                merged
            }
        };
        resolved.insert(key.clone(), ResolvedMaterialMap { components });
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MaterialEntry;

    fn flat(s: &str) -> MaterialEntry {
        MaterialEntry::Flat(s.to_string())
    }

    #[test]
    fn resolves_single_level_inheritance_with_overrides() {
        let mut raw = BTreeMap::new();
        let mut cs_components = BTreeMap::new();
        cs_components.insert("bolts".to_string(), flat("ASTM A193 Gr. B7"));
        cs_components.insert("nuts".to_string(), flat("ASTM A194 Gr. 2H"));
        raw.insert(
            "CS".to_string(),
            MaterialMap {
                inherits: None,
                components: cs_components,
            },
        );
        let mut nace_overrides = BTreeMap::new();
        nace_overrides.insert("bolts".to_string(), flat("ASTM A193 Gr. B7M"));
        raw.insert(
            "CS_NACE".to_string(),
            MaterialMap {
                inherits: Some("CS".to_string()),
                components: nace_overrides,
            },
        );

        let resolved = resolve_material_maps(&raw).unwrap();
        let nace = &resolved["CS_NACE"];
        assert_eq!(nace.components["bolts"], flat("ASTM A193 Gr. B7M"));
        // Inherited, non-overridden component survives.
        assert_eq!(nace.components["nuts"], flat("ASTM A194 Gr. 2H"));
    }

    #[test]
    fn rejects_self_inheritance() {
        let mut raw = BTreeMap::new();
        raw.insert(
            "CS".to_string(),
            MaterialMap {
                inherits: Some("CS".to_string()),
                components: BTreeMap::new(),
            },
        );
        assert!(resolve_material_maps(&raw).is_err());
    }

    #[test]
    fn rejects_unknown_base() {
        let mut raw = BTreeMap::new();
        raw.insert(
            "CS_NACE".to_string(),
            MaterialMap {
                inherits: Some("NOPE".to_string()),
                components: BTreeMap::new(),
            },
        );
        assert!(resolve_material_maps(&raw).is_err());
    }

    #[test]
    fn rejects_multi_level_inheritance() {
        let mut raw = BTreeMap::new();
        raw.insert(
            "CS".to_string(),
            MaterialMap {
                inherits: None,
                components: BTreeMap::new(),
            },
        );
        raw.insert(
            "LTCS".to_string(),
            MaterialMap {
                inherits: Some("CS".to_string()),
                components: BTreeMap::new(),
            },
        );
        raw.insert(
            "LTCS_NACE".to_string(),
            MaterialMap {
                inherits: Some("LTCS".to_string()),
                components: BTreeMap::new(),
            },
        );
        assert!(resolve_material_maps(&raw).is_err());
    }
}
