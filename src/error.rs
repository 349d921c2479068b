//! Error types for the Payroll Engine.
//!
//! Calculations over valid numbers never fail.  The variants below cover
//! the remaining failure modes: malformed finance configuration,
//! precondition violations on caller input, request caps, unreadable
//! request bodies, and the collaborators that load settings and holidays.

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, PayrollError>;

#[derive(thiserror::Error, Debug)]
pub enum PayrollError {
    /// Finance settings or a tax bracket schedule failed validation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A numeric input violated a precondition of the engine.
    #[error("invalid input: {field} {reason}")]
    InvalidInput { field: String, reason: String },

    /// A request exceeded a tenant-configured cap.
    #[error("{what} of {requested} exceeds the configured limit of {limit}")]
    LimitExceeded {
        what: String,
        requested: f64,
        limit: f64,
    },

    /// The holiday collaborator could not supply holiday dates.
    #[error("failed to load holidays: {0}")]
    Holidays(String),

    /// An HTTP request body could not be read as the expected JSON.
    /// `status` is the HTTP status the rejection maps to.
    #[error("{message}")]
    RequestBody { status: u16, message: String },

    /// A background task panicked or was cancelled.
    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PayrollError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        PayrollError::Configuration(msg.into())
    }

    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PayrollError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn limit_exceeded(what: impl Into<String>, requested: f64, limit: f64) -> Self {
        PayrollError::LimitExceeded {
            what: what.into(),
            requested,
            limit,
        }
    }
}

/// Checks that an amount is a finite, non-negative number.
pub(crate) fn ensure_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(PayrollError::invalid_input(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(PayrollError::invalid_input(
            field,
            format!("must be non-negative, got {value}"),
        ));
    }
    Ok(())
}
