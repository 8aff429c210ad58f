//! Material-selection algorithm: resolves `bolts`/`nuts`/
//! `gaskets`/`body` against the inheritance-flattened material maps.

use crate::config::ResolvedMaterialMap;
use crate::error::DataError;
use crate::model::{DecodedVds, MaterialComponent, MaterialEntry};
use std::collections::HashMap;

const SUFFIX_ORDER: [&str; 2] = ["LT", "NACE"];

/// `LT` is a prefix directly concatenated onto `base` (`LTCS`), `NACE` is an
/// underscore-joined suffix (`CS_NACE`, `LTCS_NACE`).
fn compose_key(base: &str, active: &[&str]) -> String {
    let mut key = if active.contains(&"LT") {
        format!("LT{base}")
    } else {
        base.to_string()
    };
    if active.contains(&"NACE") {
        key = format!("{key}_NACE");
    }
    key
}

/// Candidate material-map keys for `base`, most specific first: both
/// modifiers applied, then progressively dropped from the front (
/// `{LT,NACE} -> NACE -> base`), down to the bare base key.
fn candidate_keys(base: &str, decoded: &DecodedVds) -> Vec<String> {
    let active: Vec<&str> = SUFFIX_ORDER
        .iter()
        .copied()
        .filter(|s| match *s {
            "LT" => decoded.is_low_temp,
            "NACE" => decoded.is_nace_compliant,
            _ => false,
        })
        .collect();

    (0..=active.len()).map(|i| compose_key(base, &active[i..])).collect()
}

fn lookup<'a>(
    base: &str,
    decoded: &DecodedVds,
    maps: &'a HashMap<String, ResolvedMaterialMap>,
) -> Option<&'a ResolvedMaterialMap> {
    candidate_keys(base, decoded)
        .iter()
        .find_map(|key| maps.get(key))
}

/// Resolve one `PMS_AND_STANDARD` field to a material spec string.
pub fn resolve_material(
    field_name: &str,
    component: MaterialComponent,
    base_material: &str,
    decoded: &DecodedVds,
    representative_size_in: Option<f64>,
    maps: &HashMap<String, ResolvedMaterialMap>,
) -> Result<String, DataError> {
    let component_key: &'static str = component.into();
    let component_key = component_key.to_lowercase();

    let map = lookup(base_material, decoded, maps).ok_or_else(|| DataError::UnknownMaterial {
        field: field_name.to_string(),
        key: base_material.to_string(),
    })?;

    let entry = map
        .components
        .get(&component_key)
        .ok_or_else(|| DataError::UnknownComponent {
            field: field_name.to_string(),
            component: component_key.clone(),
        })?;

    match (component, entry) {
        (MaterialComponent::Gaskets, MaterialEntry::ByEndConnection(by_end)) => by_end
            .get(&decoded.end_connection.to_string())
            .cloned()
            .ok_or_else(|| DataError::UnknownComponent {
                field: field_name.to_string(),
                component: format!("gaskets[{}]", decoded.end_connection),
            }),
        (MaterialComponent::Body, MaterialEntry::BySize { size_threshold, forged, cast }) => {
            match representative_size_in {
                Some(size) if size <= *size_threshold => Ok(forged.clone()),
                Some(_) => Ok(cast.clone()),
                // No single representative size (the VDS spans a size range):
                // emit both candidates rather than guess.
                None => Ok(format!("{forged}, {cast}")),
            }
        }
        (MaterialComponent::Bolts, MaterialEntry::Flat(s))
        | (MaterialComponent::Nuts, MaterialEntry::Flat(s)) => Ok(s.clone()),
        _ => Err(DataError::UnknownComponent {
            field: field_name.to_string(),
            component: component_key,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MaterialEntry;
    use std::collections::BTreeMap;

    fn decoded(low_temp: bool, nace: bool, end: char) -> DecodedVds {
        DecodedVds {
            raw: "BSFA1R".to_string(),
            valve_type_prefix: "BS".to_string(),
            bore_type: 'F',
            piping_class: "A1".to_string(),
            end_connection: end,
            is_nace_compliant: nace,
            is_low_temp: low_temp,
            is_metal_seated: false,
            primary_standard: "API 6D".to_string(),
        }
    }

    fn maps_with(entries: &[(&str, &str, MaterialEntry)]) -> HashMap<String, ResolvedMaterialMap> {
        let mut maps: HashMap<String, ResolvedMaterialMap> = HashMap::new();
        for (map_key, comp_key, entry) in entries {
            maps.entry(map_key.to_string())
                .or_insert_with(|| ResolvedMaterialMap {
                    components: BTreeMap::new(),
                })
                .components
                .insert(comp_key.to_string(), entry.clone());
        }
        maps
    }

    #[test]
    fn candidate_order_both_modifiers() {
        let d = decoded(true, true, 'R');
        assert_eq!(candidate_keys("CS", &d), vec!["LTCS_NACE", "CS_NACE", "CS"]);
    }

    #[test]
    fn candidate_order_low_temp_only() {
        let d = decoded(true, false, 'R');
        assert_eq!(candidate_keys("CS", &d), vec!["LTCS", "CS"]);
    }

    #[test]
    fn candidate_order_nace_only() {
        let d = decoded(false, true, 'R');
        assert_eq!(candidate_keys("CS", &d), vec!["CS_NACE", "CS"]);
    }

    #[test]
    fn falls_back_to_base_when_composed_key_absent() {
        let maps = maps_with(&[("CS", "bolts", MaterialEntry::Flat("ASTM A193 Gr. B7".to_string()))]);
        let d = decoded(false, true, 'R');
        let result = resolve_material("bolts", MaterialComponent::Bolts, "CS", &d, None, &maps).unwrap();
        assert_eq!(result, "ASTM A193 Gr. B7");
    }

    #[test]
    fn prefers_most_specific_composed_key() {
        let maps = maps_with(&[
            ("CS", "bolts", MaterialEntry::Flat("ASTM A193 Gr. B7".to_string())),
            ("CS_NACE", "bolts", MaterialEntry::Flat("ASTM A193 Gr. B7M".to_string())),
        ]);
        let d = decoded(false, true, 'R');
        let result = resolve_material("bolts", MaterialComponent::Bolts, "CS", &d, None, &maps).unwrap();
        assert_eq!(result, "ASTM A193 Gr. B7M");
    }

    #[test]
    fn gaskets_branch_by_end_connection() {
        let mut by_end = BTreeMap::new();
        by_end.insert("R".to_string(), "SS316L Spiral Wound".to_string());
        by_end.insert("J".to_string(), "SS316L Ring Joint".to_string());
        let maps = maps_with(&[("CS", "gaskets", MaterialEntry::ByEndConnection(by_end))]);
        let d = decoded(false, false, 'J');
        let result = resolve_material("gaskets", MaterialComponent::Gaskets, "CS", &d, None, &maps).unwrap();
        assert_eq!(result, "SS316L Ring Joint");
    }

    #[test]
    fn body_branches_by_size_threshold() {
        let maps = maps_with(&[(
            "CS",
            "body",
            MaterialEntry::BySize {
                size_threshold: 4.0,
                forged: "ASTM A105".to_string(),
                cast: "ASTM A216 WCB".to_string(),
            },
        )]);
        let d = decoded(false, false, 'R');
        let small = resolve_material("body", MaterialComponent::Body, "CS", &d, Some(2.0), &maps).unwrap();
        assert_eq!(small, "ASTM A105");
        let large = resolve_material("body", MaterialComponent::Body, "CS", &d, Some(6.0), &maps).unwrap();
        assert_eq!(large, "ASTM A216 WCB");
    }

    #[test]
    fn body_emits_both_when_no_representative_size() {
        let maps = maps_with(&[(
            "CS",
            "body",
            MaterialEntry::BySize {
                size_threshold: 4.0,
                forged: "ASTM A105".to_string(),
                cast: "ASTM A216 WCB".to_string(),
            },
        )]);
        let d = decoded(false, false, 'R');
        let result = resolve_material("body", MaterialComponent::Body, "CS", &d, None, &maps).unwrap();
        assert_eq!(result, "ASTM A105, ASTM A216 WCB");
    }

    #[test]
    fn unknown_base_material_is_a_data_error() {
        let maps: HashMap<String, ResolvedMaterialMap> = HashMap::new();
        let d = decoded(false, false, 'R');
        let err = resolve_material("bolts", MaterialComponent::Bolts, "TITANIUM", &d, None, &maps).unwrap_err();
        assert!(matches!(err, DataError::UnknownMaterial { .. }));
    }
}
