//! cs-core: shared foundation for the co-simulation adapters.
//!
//! Contains:
//! - units (uom SI types + constructors in the exchange units)
//! - numeric (Real, simulated time, float helpers)
//! - ids (entity identifiers)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
