use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum VariableError {
    #[error("variable '{0}' already exists")]
    AlreadyExists(String),

    #[error("variable '{0}' not found")]
    NotFound(String),

    #[error("variable '{name}': dimension '{dimension}' extent {found} disagrees with extent {expected} already established for that dimension in this product")]
    DimensionMismatch {
        name: String,
        dimension: String,
        expected: usize,
        found: usize,
    },

    #[error("variable '{name}': {reason}")]
    InvalidShape { name: String, reason: String },

    #[error("invalid variable name '{0}': must match [A-Za-z_][A-Za-z0-9_]*")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, VariableError>;
