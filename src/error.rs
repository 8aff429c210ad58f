//! Error taxonomy: `InputError` and `DataError` are recoverable and
//! field/segment-named; `ConfigInvalid` aborts at startup; `Timeout` and
//! `Internal` abort a request. Propagation policy lives in `engine`.

use thiserror::Error;

/// An invalid VDS input string. Reported as HTTP 400 with the offending
/// segment; never aborts a batch item's siblings.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("unknown valve-type prefix '{0}'")]
    UnknownPrefix(String),
    #[error("unknown bore type '{0}'")]
    UnknownBore(String),
    #[error("unknown piping class '{0}'")]
    UnknownClass(String),
    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),
    #[error("unknown end connection '{0}'")]
    UnknownEndConnection(String),
    #[error("VDS code too short after prefix: '{0}'")]
    TruncatedVds(String),
    #[error("VDS code contains leading or embedded whitespace")]
    EmbeddedWhitespace,
}

/// A required upstream value is missing. For required fields this becomes a
/// `validationErrors` entry and the datasheet is still returned; for
/// optional fields it becomes a warning. Never aborts the request itself.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataError {
    #[error("{field}: MissingOperand ({detail})")]
    MissingOperand { field: String, detail: String },
    #[error("{field}: UnknownMaterial (key {key} not in material maps)")]
    UnknownMaterial { field: String, key: String },
    #[error("{field}: UnknownComponent ({component})")]
    UnknownComponent { field: String, component: String },
    #[error("{field}: MissingIndexRow (no VDS index row for {vds})")]
    MissingIndexRow { field: String, vds: String },
}

/// Detected at config-load time only; the process refuses to serve.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("IO error reading {path}: {message}")]
    Io { path: String, message: String },
    #[error("parse error in {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Top-level engine error. Only these three variants (plus `Internal`) abort
/// a request outright; `DataError`s are folded into the returned datasheet
/// by the assembler instead of propagating here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("deadline exceeded")]
    Timeout,
    #[error("internal error: {0}")]
    Internal(String),
}
