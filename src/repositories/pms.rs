//! Piping Material Specification repository.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::PipingClassRow;

/// `{sheets: [{sheetName, tables: [{headers, rows}]}]}` on-disk shape.
#[derive(Debug, Deserialize)]
struct PipingSpecFile {
    sheets: Vec<Sheet>,
}

#[derive(Debug, Deserialize)]
struct Sheet {
    #[allow(dead_code)]
    #[serde(rename = "sheetName")]
    sheet_name: String,
    tables: Vec<Table>,
}

#[derive(Debug, Deserialize)]
struct Table {
    headers: Vec<String>,
    rows: Vec<HashMap<String, serde_json::Value>>,
}

/// `class -> piping class row`, keyed uniquely.
#[derive(Debug, Clone, Default)]
pub struct PmsRepository {
    rows: HashMap<String, PipingClassRow>,
}

impl PmsRepository {
    #[cfg(test)]
    pub fn from_rows(rows: HashMap<String, PipingClassRow>) -> Self {
        Self { rows }
    }

    /// Scan the extracted-Excel JSON for the first table whose headers
    /// include `"Piping Class"` and index it by class.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let file: PipingSpecFile = serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let table = file
            .sheets
            .iter()
            .flat_map(|s| &s.tables)
            .find(|t| t.headers.iter().any(|h| h == "Piping Class"))
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "{}: no table with a 'Piping Class' column found",
                    path.display()
                ))
            })?;

        let mut rows = HashMap::new();
        for row in &table.rows {
            let class = string_col(row, "Piping Class").ok_or_else(|| {
                ConfigError::Validation(format!(
                    "{}: row missing 'Piping Class' value",
                    path.display()
                ))
            })?;
            let pressure_rating = string_col(row, "Pressure Rating").unwrap_or_default();
            let parsed = PipingClassRow {
                class: class.clone(),
                pressure_rating,
                base_material: string_col(row, "Base Material").unwrap_or_default(),
                material_group: string_col(row, "Material Group").unwrap_or_default(),
                corrosion_allowance: string_col(row, "Corrosion Allowance").unwrap_or_default(),
                service: string_col(row, "Service").unwrap_or_default(),
                design_pressure_max: number_col(row, "Design Pressure Max (barg)"),
                design_temp_min: string_col(row, "Design Temp Min (C)").unwrap_or_default(),
                design_temp_max: string_col(row, "Design Temp Max (C)").unwrap_or_default(),
                is_nace_class: bool_col(row, "NACE Class"),
                is_low_temp_class: bool_col(row, "Low Temp Class"),
            };
            rows.insert(class, parsed);
        }

        Ok(Self { rows })
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.rows.contains_key(class)
    }

    pub fn row_for(&self, class: &str) -> Option<&PipingClassRow> {
        self.rows.get(class)
    }

    /// All piping class names, sorted for deterministic listing — `HashMap`
    /// iteration order is unspecified.
    pub fn all_classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = self.rows.keys().map(String::as_str).collect();
        classes.sort_unstable();
        classes
    }

    /// Distinct pressure ratings across all rows, sorted and deduplicated.
    pub fn all_pressure_ratings(&self) -> Vec<&str> {
        let mut ratings: Vec<&str> = self
            .rows
            .values()
            .map(|r| r.pressure_rating.as_str())
            .filter(|r| !r.is_empty())
            .collect();
        ratings.sort_unstable();
        ratings.dedup();
        ratings
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse a pressure rating like `"150#"` or `"150lb"` into its numeric form
/// plus the original string.
pub fn pressure_rating_numeric(rating: &str) -> Option<i64> {
    let trimmed = rating
        .trim()
        .trim_end_matches('#')
        .trim_end_matches("lb")
        .trim_end_matches("LB")
        .trim();
    trimmed.parse().ok()
}

fn string_col(row: &HashMap<String, serde_json::Value>, key: &str) -> Option<String> {
    row.get(key).and_then(|v| match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn number_col(row: &HashMap<String, serde_json::Value>, key: &str) -> Option<f64> {
    row.get(key).and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    })
}

fn bool_col(row: &HashMap<String, serde_json::Value>, key: &str) -> bool {
    row.get(key)
        .map(|v| match v {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::String(s) => s.eq_ignore_ascii_case("yes") || s.eq_ignore_ascii_case("true"),
            _ => false,
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hash_suffix() {
        assert_eq!(pressure_rating_numeric("150#"), Some(150));
    }

    #[test]
    fn parses_lb_suffix() {
        assert_eq!(pressure_rating_numeric("300lb"), Some(300));
    }

    #[test]
    fn parses_bare_number() {
        assert_eq!(pressure_rating_numeric("2500"), Some(2500));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(pressure_rating_numeric("n/a"), None);
    }
}
