use thiserror::Error;

pub type EngineResult<T> = Result<T, ProjectionError>;

/// Input validation failures raised by the projection engine.
///
/// None of these are retryable; callers surface the message to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Amount must be greater than zero (got {amount})")]
    InvalidAmount { amount: f64 },

    #[error("Investment duration must be at least one month (got {months})")]
    InvalidHorizon { months: i64 },

    #[error("Investment duration can be at most {max} months (got {months})")]
    HorizonTooLong { months: i64, max: u32 },

    #[error("Minimum amount should be between ₹{lower} and ₹{upper} (got ₹{value})")]
    MinOutOfBounds { value: f64, lower: f64, upper: f64 },

    #[error("Maximum amount should be between ₹{lower} and ₹{upper} (got ₹{value})")]
    MaxOutOfBounds { value: f64, lower: f64, upper: f64 },

    #[error("Minimum amount ₹{min} must be less than maximum amount ₹{max}")]
    MinNotLessThanMax { min: f64, max: f64 },

    #[error("Invalid rate table: {reason}")]
    InvalidRateTable { reason: String },
}

impl ProjectionError {
    pub fn code(&self) -> &'static str {
        match self {
            ProjectionError::InvalidAmount { .. } => "InvalidAmount",
            ProjectionError::InvalidHorizon { .. } | ProjectionError::HorizonTooLong { .. } => {
                "InvalidHorizon"
            }
            ProjectionError::MinOutOfBounds { .. } => "MinOutOfBounds",
            ProjectionError::MaxOutOfBounds { .. } => "MaxOutOfBounds",
            ProjectionError::MinNotLessThanMax { .. } => "MinNotLessThanMax",
            ProjectionError::InvalidRateTable { .. } => "InvalidRateTable",
        }
    }
}
