//! Shared fixtures for unit tests across modules. Not part of the public API.

use std::collections::BTreeMap;

use regex::Regex;

use crate::config::{PrefixRule, SourServiceText, VdsGrammar};

/// A small but representative grammar covering both prefix shapes (one that
/// carries a separate metal-seated flag, one that doesn't) and both
/// modifiers, matching the scenarios used throughout the test suite.
pub fn sample_grammar() -> VdsGrammar {
    let mut prefixes = BTreeMap::new();
    prefixes.insert(
        "BS".to_string(),
        PrefixRule {
            valve_type_name: "Ball Valve".to_string(),
            primary_standard: "API 6D".to_string(),
            supports_metal_flag: true,
        },
    );
    prefixes.insert(
        "GS".to_string(),
        PrefixRule {
            valve_type_name: "Gate Valve".to_string(),
            primary_standard: "API 600".to_string(),
            supports_metal_flag: false,
        },
    );

    let mut bore_types = BTreeMap::new();
    bore_types.insert('F', "Full Bore".to_string());
    bore_types.insert('R', "Reduced Bore".to_string());
    bore_types.insert('M', "Metal-Seated".to_string());

    let mut modifiers = BTreeMap::new();
    modifiers.insert('N', "is_nace_compliant".to_string());
    modifiers.insert('L', "is_low_temp".to_string());

    let mut end_connections = BTreeMap::new();
    end_connections.insert('R', "Flanged ASME B16.5 RF".to_string());
    end_connections.insert('J', "Flanged ASME B16.5 RTJ".to_string());
    end_connections.insert('W', "Butt Weld ASME B16.25".to_string());
    end_connections.insert('T', "Threaded ASME B1.20.1".to_string());

    let piping_class_pattern = "^[A-Z][0-9]+".to_string();
    let class_regex = Regex::new(&piping_class_pattern).unwrap();

    VdsGrammar {
        prefixes,
        bore_types,
        piping_class_pattern,
        class_regex,
        modifiers,
        end_connections,
        source_service: SourServiceText {
            nace_text: "Sour Service (NACE MR0175 compliant)".to_string(),
            dash_text: "-".to_string(),
        },
    }
}
