//! VDS index repository: pre-computed values keyed by full VDS
//! code, for datasheet values that cannot be reconstructed from rules alone.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::model::VdsIndexRow;

#[derive(Debug, Clone, Default)]
pub struct VdsIndexRepository {
    rows: HashMap<String, VdsIndexRow>,
}

impl VdsIndexRepository {
    #[cfg(test)]
    pub fn from_rows(rows: Vec<VdsIndexRow>) -> Self {
        Self {
            rows: rows.into_iter().map(|r| (r.vds.clone(), r)).collect(),
        }
    }

    /// `vds_index.json`: a single top-level array of row objects.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let rows: Vec<VdsIndexRow> = serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            rows: rows.into_iter().map(|r| (r.vds.clone(), r)).collect(),
        })
    }

    pub fn row_for(&self, vds: &str) -> Option<&VdsIndexRow> {
        self.rows.get(vds)
    }

    /// All indexed VDS codes, optionally filtered by a predicate over the
    /// raw code (the HTTP layer filters by valve-type prefix here), sorted
    /// lexicographically — `HashMap` iteration order is unspecified and
    /// paginating over it would make identical requests return different
    /// pages across runs.
    pub fn all_vds_codes(&self, filter: impl Fn(&str) -> bool) -> Vec<&str> {
        let mut codes: Vec<&str> = self.rows.keys().map(String::as_str).filter(|v| filter(v)).collect();
        codes.sort_unstable();
        codes
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
