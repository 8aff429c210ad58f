//! Read-only, in-memory indexes over the three source-data files.
//! Built once at startup; any number of readers may share them without
//! locking since nothing here is ever mutated after construction.

mod pms;
mod standards;
mod vds_index;

pub use pms::{pressure_rating_numeric, PmsRepository};
pub use standards::StandardsRepository;
pub use vds_index::VdsIndexRepository;
