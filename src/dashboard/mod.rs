//! Partner-wide and per-campaign aggregation over mission logs.

pub mod co2;
pub mod endpoints;
pub mod manager;
pub use endpoints::*;
