//! `vds_lint`: resolves Valve Data Sheet (VDS) codes into fully traced
//! engineering datasheets against configured grammar, piping specifications,
//! engineering standards, and material maps.

pub mod assembler;
pub mod config;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod http;
pub mod model;
pub mod repositories;
pub mod resolver;

#[cfg(test)]
pub mod test_support;

pub use config::Config;
pub use engine::Engine;
pub use error::{ConfigError, DataError, EngineError, InputError};
pub use model::{BatchResult, Datasheet, DecodedVds};
