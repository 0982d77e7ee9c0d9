use thiserror::Error;

/// A malformed transform or alignment parameter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("invalid parameter `{name}`: {reason}")]
    Invalid { name: String, reason: String },
}

impl ParameterError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ParameterError>;
