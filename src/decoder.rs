//! VDS decoder: a grammar-directed, greedy, left-to-right,
//! case-insensitive parser. Touches the piping repository only to confirm
//! the decoded class exists — never the standards or VDS-index repositories.

use crate::config::VdsGrammar;
use crate::error::InputError;
use crate::model::DecodedVds;
use crate::repositories::PmsRepository;

/// Parse `vds` into a `DecodedVds` per the grammar in `grammar`, confirming
/// the piping class exists in `pms`.
pub fn decode(
    vds: &str,
    grammar: &VdsGrammar,
    pms: &PmsRepository,
) -> Result<DecodedVds, InputError> {
    // Trailing whitespace is stripped; leading or embedded whitespace is rejected.
    let trimmed_end = vds.trim_end();
    if trimmed_end.trim_start() != trimmed_end || trimmed_end.chars().any(char::is_whitespace) {
        return Err(InputError::EmbeddedWhitespace);
    }

    let upper = trimmed_end.to_uppercase();

    // 1. Valve-type prefix: longest match from the configured set.
    let prefix = longest_prefix_match(&upper, grammar)
        .ok_or_else(|| InputError::UnknownPrefix(upper.clone()))?;
    let prefix_rule = &grammar.prefixes[&prefix];
    let mut rest = &upper[prefix.len()..];

    // 2. Bore type: exactly one character from the configured bore set.
    let mut chars = rest.chars();
    let bore_type = chars
        .next()
        .ok_or_else(|| InputError::TruncatedVds(upper.clone()))?;
    if !grammar.bore_types.contains_key(&bore_type) {
        return Err(InputError::UnknownBore(bore_type.to_string()));
    }
    rest = &rest[bore_type.len_utf8()..];

    // 3. Optional metal-seated flag, immediately after bore type, only for
    // prefixes configured to carry it as a separate character. If the bore
    // itself is 'M', metal-seated is already implied and no flag is consumed.
    let mut is_metal_seated = bore_type == 'M';
    if !is_metal_seated && prefix_rule.supports_metal_flag {
        if let Some('M') = rest.chars().next() {
            is_metal_seated = true;
            rest = &rest['M'.len_utf8()..];
        }
    }

    // 4. Piping class: longest regex match anchored at the start of `rest`,
    // confirmed present in the piping repository.
    let class_match = grammar
        .class_regex
        .find(rest)
        .filter(|m| m.start() == 0)
        .ok_or_else(|| InputError::UnknownClass(upper.clone()))?;
    let piping_class = class_match.as_str().to_string();
    if !pms.has_class(&piping_class) {
        return Err(InputError::UnknownClass(piping_class));
    }
    rest = &rest[class_match.end()..];

    // Everything left must be modifiers (zero or more) followed by exactly
    // one end-connection character.
    if rest.is_empty() {
        return Err(InputError::TruncatedVds(upper.clone()));
    }
    let rest_chars: Vec<char> = rest.chars().collect();
    let (modifier_chars, end_char) = rest_chars.split_at(rest_chars.len() - 1);
    let end_char = end_char[0];

    // 5. Modifiers: zero or more configured single-letter modifiers.
    let mut is_nace_compliant = false;
    let mut is_low_temp = false;
    for &m in modifier_chars {
        match grammar.modifiers.get(&m).map(String::as_str) {
            Some("is_nace_compliant") => is_nace_compliant = true,
            Some("is_low_temp") => is_low_temp = true,
            Some(other) => {
                return Err(InputError::UnknownModifier(format!(
                    "'{m}' maps to unrecognized attribute '{other}'"
                )));
            }
            None => return Err(InputError::UnknownModifier(m.to_string())),
        }
    }

    // 6. End connection: required, single character, must be configured.
    if !grammar.end_connections.contains_key(&end_char) {
        return Err(InputError::UnknownEndConnection(end_char.to_string()));
    }

    let primary_standard = prefix_rule.primary_standard.clone();

    Ok(DecodedVds {
        raw: upper,
        valve_type_prefix: prefix,
        bore_type,
        piping_class,
        end_connection: end_char,
        is_nace_compliant,
        is_low_temp,
        is_metal_seated,
        primary_standard,
    })
}

fn longest_prefix_match(upper: &str, grammar: &VdsGrammar) -> Option<String> {
    grammar
        .prefixes
        .keys()
        .filter(|p| upper.starts_with(p.as_str()))
        .max_by_key(|p| p.len())
        .cloned()
}
