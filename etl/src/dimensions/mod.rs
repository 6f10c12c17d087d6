//! Dimension builders. Each one reads the shared immutable extract and
//! produces an independent table, so they can run concurrently.

mod attributes;
pub mod location;
pub mod time;
pub mod transaction;
pub mod vehicle;

pub use location::{UNSPECIFIED_CANTON_CODE, build_location_dimension};
pub use time::{TIME_RANGE_END, TIME_RANGE_START, build_time_dimension, build_time_dimension_between};
pub use transaction::build_transaction_dimension;
pub use vehicle::build_vehicle_dimension;
