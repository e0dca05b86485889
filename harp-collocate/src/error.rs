//! Structured errors for the collocation engine (§4.8 "Failure model").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollocationError {
    #[error("product {source_product:?} ({filename:?}) failed to load: {reason}")]
    Load { source_product: String, filename: String, reason: String },

    #[error("product {source_product:?}: required variable {var:?} is missing")]
    MissingVariable { source_product: String, var: String },

    #[error("criterion on {var:?}: {source}")]
    Unit { var: String, #[source] source: harp_units::UnitError },

    #[error("product {source_product:?}: {source}")]
    Variable { source_product: String, #[source] source: harp_product::VariableError },

    #[error("collocation matchup cancelled")]
    Cancelled,

    #[error("invalid collocation configuration: {0}")]
    InvalidCriterion(String),

    #[error("failed to write collocation result: {0}")]
    Csv(String),
}

pub type Result<T> = std::result::Result<T, CollocationError>;
