//! Transformation core of the vehicle-registration warehouse.
//!
//! Everything in this crate is a pure, single-threaded batch transformation
//! over an in-memory extract: the CSV payload is parsed into a [`RawTable`],
//! the four dimension builders derive deduplicated attribute tables with
//! surrogate keys, and the [`FactBuilder`] resolves those keys for every raw
//! record. Loading the results anywhere is the caller's job.

pub mod columns;
pub mod dimensions;
pub mod extract;
pub mod fact;
pub mod models;
pub mod reference;
pub mod utils;

pub use columns::{ColumnMapping, SourceField};
pub use dimensions::{
    build_location_dimension, build_time_dimension, build_transaction_dimension,
    build_vehicle_dimension,
};
pub use extract::{RawRecord, RawTable};
pub use fact::{FactBuilder, FactTable};

/// Surrogate key every fact row falls back to when a lookup misses.
///
/// Row 1 of each dimension doubles as the "unknown" member; the dimension
/// builders always emit it as long as the extract has at least one record.
pub const DEFAULT_DIMENSION_KEY: i64 = 1;
