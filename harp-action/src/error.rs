use thiserror::Error;

/// A lexing or parsing failure in the action DSL, anchored to the byte
/// offset of the offending token.
#[derive(Debug, Clone, Error)]
#[error("syntax error at offset {offset}: {message}")]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        SyntaxError { offset, message: message.into() }
    }
}

/// A semantic error found while lowering the AST to typed [`crate::Action`]
/// records: unknown function, wrong arity, a bad argument type.
#[derive(Debug, Clone, Error)]
#[error("script error at offset {offset}: {message}")]
pub struct ScriptError {
    pub offset: usize,
    pub message: String,
}

impl ScriptError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        ScriptError { offset, message: message.into() }
    }
}

/// Top-level error produced by parsing, analysis, or execution of an
/// action list.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Unit(#[from] harp_units::UnitError),

    #[error(transparent)]
    Variable(#[from] harp_product::VariableError),

    #[error(transparent)]
    Derivation(#[from] harp_derive::DerivationError),

    #[error("execution error: {0}")]
    Execution(String),
}

pub type Result<T> = std::result::Result<T, ActionError>;
