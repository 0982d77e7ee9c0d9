//! Parameter records for transform steps.
//!
//! Every transform takes an explicit, serde-backed parameter record instead of
//! free-form keyword arguments. Records validate themselves so that bad values
//! are rejected when a step is built or edited, not when it first runs.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ParameterError, Result};

/// A named configuration record for one transform type.
pub trait StepParams: Serialize + DeserializeOwned + Clone {
    /// Check value constraints that the type system cannot express.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Reject negative, NaN or infinite values.
pub fn require_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ParameterError::invalid(name, format!("{value} is not finite")));
    }
    if value < 0.0 {
        return Err(ParameterError::invalid(
            name,
            format!("{value} must not be negative"),
        ));
    }
    Ok(())
}

/// Reject zero as well as everything [`require_non_negative`] rejects.
pub fn require_positive(name: &str, value: f64) -> Result<()> {
    require_non_negative(name, value)?;
    if value == 0.0 {
        return Err(ParameterError::invalid(name, "must be greater than zero"));
    }
    Ok(())
}

/// Reject empty or whitespace-only column names.
pub fn require_column_name(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ParameterError::invalid(name, "column name must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_negative_accepts_zero() {
        assert!(require_non_negative("max_latency", 0.0).is_ok());
        assert!(require_non_negative("max_latency", 2.5).is_ok());
    }

    #[test]
    fn non_negative_rejects_bad_values() {
        assert!(require_non_negative("max_latency", -1.0).is_err());
        assert!(require_non_negative("max_latency", f64::NAN).is_err());
        assert!(require_non_negative("max_latency", f64::INFINITY).is_err());
    }

    #[test]
    fn positive_rejects_zero() {
        let err = require_positive("interval", 0.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid parameter `interval`: must be greater than zero"
        );
    }

    #[test]
    fn column_name_rejects_blank() {
        assert!(require_column_name("returned_colname", "  ").is_err());
        assert!(require_column_name("returned_colname", "aligned").is_ok());
    }
}
