mod autoreg;
mod error;
mod pipeline;

pub use autoreg::AutoReg;
pub use error::ForecastError;
pub use pipeline::{ForecastOutput, ForecastPipeline, ForecastSettings, Point, split};
