use core::fmt;

/// Minimal error set for core-domain validation & parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreError {
    InvalidToken,
    InvalidId,
    InvalidHex,
    InvalidTimestamp,
    /// Direction token other than `positive` / `negative`.
    InvalidDirection(String),
    DomainOutOfRange(&'static str),
    DuplicateIndicator(String),
    DuplicateEntity(String),
    UnknownIndicator(String),
    EmptyFormula,
    EmptyTable,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidToken => write!(f, "invalid token"),
            CoreError::InvalidId => write!(f, "invalid id"),
            CoreError::InvalidHex => write!(f, "invalid hex"),
            CoreError::InvalidTimestamp => write!(f, "invalid timestamp"),
            CoreError::InvalidDirection(d) => {
                write!(f, "invalid direction {d:?}: must be \"positive\" or \"negative\"")
            }
            CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
            CoreError::DuplicateIndicator(id) => write!(f, "duplicate indicator: {id}"),
            CoreError::DuplicateEntity(id) => write!(f, "duplicate entity: {id}"),
            CoreError::UnknownIndicator(id) => write!(f, "unknown indicator: {id}"),
            CoreError::EmptyFormula => write!(f, "formula has no indicators"),
            CoreError::EmptyTable => write!(f, "indicator table has no entities"),
        }
    }
}

impl std::error::Error for CoreError {}
