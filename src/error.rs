use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("wrong access phrase")]
    Auth,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("failed to load the schedule: {0}")]
    Load(String),

    #[error("column '{column}' not found in the sheet. Available columns: {available:?}")]
    Schema {
        column: String,
        available: Vec<String>,
    },

    #[error("invalid input: {0}")]
    Validation(String),
}

/// A single recipient the mail transport could not deliver to.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{address}: {cause}")]
pub struct DeliveryError {
    pub address: String,
    pub cause: String,
}
