//! Static lookup tables shipped with the warehouse.

pub mod calendar;
pub mod cantons;

pub use calendar::{localized_month, localized_weekday};
pub use cantons::{CantonInfo, COUNTRY, lookup_canton};
