//! UDUNITS-compatible unit parsing and conversion.
//!
//! Supports compound expressions such as `hPa`, `molec/cm3`, `kg.m-2.s-1`.
//! Angle, substance, and the other base quantities are tracked as
//! independent dimensions so that e.g. `deg` and a plain dimensionless
//! ratio are never mistaken for compatible units.

pub mod dimension;
mod error;
mod parser;
mod registry;
mod unit;

pub use error::{Result, UnitError};
pub use unit::{factor, is_compatible, Unit};
