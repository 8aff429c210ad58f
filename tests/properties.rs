//! Property-based tests over the decode/generate pipeline, against the
//! checked-in fixtures. Valid VDS codes are built from the same alphabet the
//! fixtures declare, rather than from arbitrary strings, since the grammar
//! rejects most random input before any interesting property can be checked.

use std::path::PathBuf;
use std::sync::Arc;

use proptest::prelude::*;

use vds_lint::config::Config;
use vds_lint::engine::Engine;
use vds_lint::repositories::{PmsRepository, StandardsRepository, VdsIndexRepository};

fn config_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config")
}

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn engine() -> Engine {
    let config = Config::load(&config_dir()).expect("load config");
    let pms = PmsRepository::load(&data_dir().join("piping_spec.json")).expect("load piping spec");
    let standards =
        StandardsRepository::load(&data_dir().join("standards_clauses.json")).expect("load standards clauses");
    let vds_index = VdsIndexRepository::load(&data_dir().join("vds_index.json")).expect("load VDS index");
    Engine::new(Arc::new(config), Arc::new(pms), Arc::new(standards), Arc::new(vds_index))
}

fn prefix_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof!["BS", "GS"]
}

fn bore_strategy() -> impl Strategy<Value = char> {
    prop_oneof!['F', 'R']
}

fn class_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof!["A1", "B1", "D1", "G1"]
}

fn modifier_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof!["", "N", "L", "NL", "LN"]
}

fn end_connection_strategy() -> impl Strategy<Value = char> {
    prop_oneof!['R', 'J', 'W', 'T']
}

fn valid_vds_strategy() -> impl Strategy<Value = String> {
    (
        prefix_strategy(),
        bore_strategy(),
        class_strategy(),
        modifier_strategy(),
        end_connection_strategy(),
    )
        .prop_map(|(prefix, bore, class, modifiers, end)| format!("{prefix}{bore}{class}{modifiers}{end}"))
}

proptest! {
    #[test]
    fn generation_is_deterministic(vds in valid_vds_strategy()) {
        let engine = engine();
        let first = engine.generate(&vds).expect("generate");
        let second = engine.generate(&vds).expect("generate");

        prop_assert_eq!(first.metadata.completion.populated, second.metadata.completion.populated);
        prop_assert_eq!(first.metadata.validation_status, second.metadata.validation_status);
        for (a, b) in first.sections.iter().zip(second.sections.iter()) {
            for (fa, fb) in a.fields.iter().zip(b.fields.iter()) {
                prop_assert_eq!(&fa.value, &fb.value);
            }
        }
    }

    #[test]
    fn decoded_raw_round_trips_case_normalized(vds in valid_vds_strategy()) {
        let engine = engine();
        let lowercase = vds.to_lowercase();
        let with_trailing_space = format!("{vds}  ");

        let decoded = engine.decode(&lowercase).expect("decode lowercase");
        prop_assert_eq!(&decoded.raw, &vds);

        let decoded_trailing = engine.decode(&with_trailing_space).expect("decode with trailing space");
        prop_assert_eq!(&decoded_trailing.raw, &vds);
    }

    #[test]
    fn every_generated_datasheet_covers_the_full_schema(vds in valid_vds_strategy()) {
        let engine = engine();
        let datasheet = engine.generate(&vds).expect("generate");
        let schema_len = engine.config().field_mappings.fields.len();

        let produced: usize = datasheet.sections.iter().map(|s| s.fields.len()).sum();
        prop_assert_eq!(produced, schema_len);

        let mut seen = std::collections::HashSet::new();
        for section in &datasheet.sections {
            for field in &section.fields {
                prop_assert!(seen.insert(field.field_name.clone()));
            }
        }
    }

    #[test]
    fn flat_view_is_exactly_the_structured_fields(vds in valid_vds_strategy()) {
        let engine = engine();
        let datasheet = engine.generate(&vds).expect("generate");
        let flat = datasheet.flat_view();

        let structured_names: Vec<String> = datasheet
            .sections
            .iter()
            .flat_map(|s| s.fields.iter().map(|f| f.field_name.clone()))
            .collect();
        let flat_names: Vec<String> = flat.fields.iter().map(|(n, _)| n.clone()).collect();
        prop_assert_eq!(structured_names, flat_names);
    }
}
