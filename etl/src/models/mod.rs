mod fact;
mod location;
mod time;
mod transaction;
mod vehicle;

pub use fact::{FactBuildStats, FactRow};
pub use location::{LocationDimension, LocationDimensionRow};
pub use time::{TimeDimension, TimeDimensionRow};
pub use transaction::{TransactionDimension, TransactionDimensionRow};
pub use vehicle::{VehicleDimension, VehicleDimensionRow};
