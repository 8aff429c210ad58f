//! Standards-clause repository. Multi-indexed over
//! `datasheetField`, `appliesTo`, and `standard`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::StandardClause;

#[derive(Debug, Deserialize)]
struct ClausesFile {
    clauses: Vec<StandardClause>,
}

#[derive(Debug, Clone, Default)]
pub struct StandardsRepository {
    clauses: Vec<StandardClause>,
    by_field: HashMap<String, Vec<usize>>,
    by_valve_type: HashMap<String, Vec<usize>>,
    by_standard: HashMap<String, Vec<usize>>,
}

impl StandardsRepository {
    #[cfg(test)]
    pub fn from_clauses(clauses: Vec<StandardClause>) -> Self {
        Self::build(clauses)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let file: ClausesFile = serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::build(file.clauses))
    }

    fn build(clauses: Vec<StandardClause>) -> Self {
        let mut by_field: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_valve_type: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_standard: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, clause) in clauses.iter().enumerate() {
            if let Some(field) = &clause.datasheet_field {
                by_field.entry(field.clone()).or_default().push(i);
            }
            for vt in &clause.applies_to {
                by_valve_type.entry(vt.clone()).or_default().push(i);
            }
            by_standard.entry(clause.standard.clone()).or_default().push(i);
        }

        Self {
            clauses,
            by_field,
            by_valve_type,
            by_standard,
        }
    }

    pub fn clauses_for_field(&self, field_name: &str) -> Vec<&StandardClause> {
        self.by_field
            .get(field_name)
            .map(|idxs| idxs.iter().map(|&i| &self.clauses[i]).collect())
            .unwrap_or_default()
    }

    pub fn clauses_for_valve_type(&self, valve_type: &str) -> Vec<&StandardClause> {
        self.by_valve_type
            .get(valve_type)
            .map(|idxs| idxs.iter().map(|&i| &self.clauses[i]).collect())
            .unwrap_or_default()
    }

    #[allow(dead_code)]
    pub fn clauses_for_standard(&self, standard: &str) -> Vec<&StandardClause> {
        self.by_standard
            .get(standard)
            .map(|idxs| idxs.iter().map(|&i| &self.clauses[i]).collect())
            .unwrap_or_default()
    }

    /// The value of the single mandatory clause for `field_name` that
    /// applies to `valve_type`, if exactly one exists.
    pub fn value_for_field(&self, field_name: &str, valve_type: &str) -> Option<(&StandardClause, String)> {
        use crate::model::ClauseRuleType;
        let mut matches = self
            .clauses_for_field(field_name)
            .into_iter()
            .filter(|c| c.rule_type == ClauseRuleType::Mandatory)
            .filter(|c| c.applies_to.iter().any(|v| v == valve_type));
        let clause = matches.next()?;
        if matches.next().is_some() {
            // More than one mandatory clause for this field/valve-type pair —
            // ambiguous; treat as absent rather than pick arbitrarily.
            return None;
        }
        Some((clause, clause.text.clone()))
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}
