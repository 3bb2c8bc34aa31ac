use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ForecastError {
    #[error("not enough observations: need {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("normal equations are singular")]
    Singular,

    #[error("series contains non-finite values")]
    NonFinite,

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}
