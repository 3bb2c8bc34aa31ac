pub mod api;
mod error;

pub use api::{StockData, YahooAPI, parse_chart, validate_range, validate_range_on};
pub use error::ApiError;
