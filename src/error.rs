use std::fmt;

/// All errors produced by cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CadenceError {
    /// Invalid rule or filter configuration, reported by the builder.
    Config { message: String },

    /// A query the caller should not have made (inverted interval, listing
    /// an infinite rule, ...).
    InvalidQuery { message: String },

    /// An internal invariant did not hold. This is a bug, not bad input.
    Invariant { message: String },

    /// No instant satisfies the rule within the search limit.
    Exhausted { message: String },

    /// Date arithmetic left the range jiff can represent.
    Calendar { message: String },

    /// Structured (JSON) encoding or decoding failed.
    Serialization { message: String },
}

impl fmt::Display for CadenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { message } => write!(f, "invalid configuration: {message}"),
            Self::InvalidQuery { message } => write!(f, "invalid query: {message}"),
            Self::Invariant { message } => write!(f, "internal error: {message}"),
            Self::Exhausted { message } => write!(f, "{message}"),
            Self::Calendar { message } => write!(f, "{message}"),
            Self::Serialization { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for CadenceError {}

impl CadenceError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    pub fn exhausted(message: impl Into<String>) -> Self {
        Self::Exhausted {
            message: message.into(),
        }
    }

    pub fn calendar(message: impl Into<String>) -> Self {
        Self::Calendar {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// True for errors caused by how the rule was configured.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }

    /// Format the error for terminal output.
    pub fn display_rich(&self) -> String {
        format!("error: {self}")
    }
}

impl From<jiff::Error> for CadenceError {
    fn from(e: jiff::Error) -> Self {
        Self::calendar(format!("date arithmetic failed: {e}"))
    }
}
