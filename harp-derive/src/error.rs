use harp_product::DimensionType;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("cannot derive '{name}' {dims:?} [{unit}]: {trace}")]
pub struct DerivationError {
    pub name: String,
    pub dims: Vec<DimensionType>,
    pub unit: String,
    /// Human-readable record of the rules that were tried and why each
    /// one failed, innermost attempt last.
    pub trace: String,
}

pub type Result<T> = std::result::Result<T, DerivationError>;
