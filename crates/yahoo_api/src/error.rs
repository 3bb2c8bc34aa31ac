use history_model::{Interval, Period};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("upstream error {code}: {description}")]
    Api { code: String, description: String },

    #[error("no data for ticker {0:?}")]
    NotFound(String),

    #[error("interval {interval} is not available for period {period}")]
    InvalidRange { period: Period, interval: Interval },

    #[error("requested {requested} bars but upstream returned {returned}")]
    Granularity { requested: Interval, returned: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}
