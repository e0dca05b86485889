use thiserror::Error;

/// Errors raised by the unit engine.
///
/// Both variants carry the two unit strings involved so a caller can report
/// `UnitError(from, to)` without re-parsing the offending expression.
#[derive(Debug, Clone, Error)]
pub enum UnitError {
    #[error("invalid unit string '{0}'")]
    InvalidSyntax(String),

    #[error("units '{from}' and '{to}' are not compatible")]
    Incompatible { from: String, to: String },
}

pub type Result<T> = std::result::Result<T, UnitError>;
