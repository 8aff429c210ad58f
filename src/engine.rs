//! The `Engine` ties config, repositories, decoder, resolver, and assembler
//! together behind one entry point. Holds only `Arc`-shared,
//! immutable state — no locks, no mutation after construction.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::decoder;
use crate::error::EngineError;
use crate::model::{BatchResult, BatchStatus, Datasheet, DecodedVds};
use crate::repositories::{PmsRepository, StandardsRepository, VdsIndexRepository};
use crate::resolver::ResolveContext;
use crate::assembler;

#[derive(Clone)]
pub struct Engine {
    config: Arc<Config>,
    pms: Arc<PmsRepository>,
    standards: Arc<StandardsRepository>,
    vds_index: Arc<VdsIndexRepository>,
}

impl Engine {
    pub fn new(
        config: Arc<Config>,
        pms: Arc<PmsRepository>,
        standards: Arc<StandardsRepository>,
        vds_index: Arc<VdsIndexRepository>,
    ) -> Self {
        Self {
            config,
            pms,
            standards,
            vds_index,
        }
    }

    pub fn generate(&self, vds: &str) -> Result<Datasheet, EngineError> {
        self.generate_with_deadline(vds, None)
    }

    /// Decode without resolving fields, for callers that only need the
    /// parsed attributes (the HTTP `/v1/decode` route, CLI tooling).
    pub fn decode(&self, vds: &str) -> Result<DecodedVds, EngineError> {
        decoder::decode(vds, &self.config.grammar, &self.pms).map_err(EngineError::from)
    }

    /// Like `generate`, but aborts with `EngineError::Timeout` if `deadline`
    /// has already passed between the decode and assembly phases.
    pub fn generate_with_deadline(&self, vds: &str, deadline: Option<Instant>) -> Result<Datasheet, EngineError> {
        let decoded = decoder::decode(vds, &self.config.grammar, &self.pms)?;
        check_deadline(deadline)?;

        let pms_row = self.pms.row_for(&decoded.piping_class).ok_or_else(|| {
            EngineError::Internal(format!(
                "decoder confirmed piping class '{}' exists but it vanished from the repository",
                decoded.piping_class
            ))
        })?;
        let vds_index_row = self.vds_index.row_for(&decoded.raw);

        let ctx = ResolveContext {
            grammar: &self.config.grammar,
            decoded: &decoded,
            pms_row,
            vds_index_row,
            standards: &self.standards,
            material_maps: &self.config.resolved_material_maps,
        };

        check_deadline(deadline)?;
        let datasheet = assembler::assemble(&self.config, &ctx);
        Ok(datasheet)
    }

    /// Resolve every VDS code independently. One code's `InputError` never
    /// aborts its siblings' results.
    pub fn generate_batch(&self, vds_codes: &[String]) -> Vec<BatchResult> {
        vds_codes
            .iter()
            .map(|vds| match self.generate(vds) {
                Ok(datasheet) => BatchResult {
                    vds: vds.clone(),
                    status: BatchStatus::Success,
                    data: Some(datasheet),
                    error: None,
                },
                Err(err) => BatchResult {
                    vds: vds.clone(),
                    status: BatchStatus::Error,
                    data: None,
                    error: Some(err.to_string()),
                },
            })
            .collect()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn vds_index(&self) -> &VdsIndexRepository {
        &self.vds_index
    }

    pub fn pms_repository(&self) -> &PmsRepository {
        &self.pms
    }

    pub fn standards_repository(&self) -> &StandardsRepository {
        &self.standards
    }

    pub fn valve_type_name(&self, prefix: &str) -> Option<&str> {
        self.config.grammar.prefixes.get(prefix).map(|p| p.valve_type_name.as_str())
    }

    pub fn field_count(&self) -> usize {
        self.config.field_mappings.fields.len()
    }
}

fn check_deadline(deadline: Option<Instant>) -> Result<(), EngineError> {
    match deadline {
        Some(d) if Instant::now() >= d => Err(EngineError::Timeout),
        _ => Ok(()),
    }
}
