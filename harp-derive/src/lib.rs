//! Walks a static rule database to synthesise a requested
//! `(name, dims, unit)` variable that a product does not already carry.
//!
//! The rule database itself (the `inputs -> fn -> output` algebraic
//! identities between physical quantities) is data; the engine that walks
//! it depth-first, memoising per call and detecting cycles, is the part
//! specified here.

mod engine;
mod error;
mod registry;
mod rule;

pub use engine::derive;
pub use error::{DerivationError, Result};
pub use registry::RULES;
pub use rule::{InputSpec, Rule};
