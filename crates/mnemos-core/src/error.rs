use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A threshold, rate or duration outside its admissible range.
    InvalidParameter(String),
    /// A payload that cannot be canonicalized or fails its schema.
    Validation(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            CoreError::Validation(msg) => write!(f, "validation error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Reject values that are NaN, infinite, or outside `[lo, hi]`.
pub(crate) fn ensure_in_range(name: &str, value: f64, lo: f64, hi: f64) -> Result<()> {
    if !value.is_finite() || value < lo || value > hi {
        return Err(CoreError::InvalidParameter(format!(
            "{name} must be within [{lo}, {hi}], got {value}"
        )));
    }
    Ok(())
}
