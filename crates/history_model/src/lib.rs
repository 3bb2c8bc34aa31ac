use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod prediction;
mod range;
mod ticker;

pub use prediction::{Action, Prediction};
pub use range::{Interval, ParseError, Period};
pub use ticker::{STOCKS, Stock};

/// One bar of a historical price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Instrument metadata reported alongside a price history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInfo {
    pub symbol: String,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub currency: Option<String>,
    pub exchange_name: Option<String>,
    pub instrument_type: Option<String>,
    pub regular_market_price: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub timezone: Option<String>,
}

impl StockInfo {
    /// Display name, falling back from the long name to the symbol.
    pub fn name(&self) -> &str {
        self.long_name
            .as_deref()
            .or(self.short_name.as_deref())
            .unwrap_or(&self.symbol)
    }

    /// Label/value pairs of the known fields, in display order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![("Symbol", self.symbol.clone())];
        let text = [
            ("Name", &self.long_name),
            ("Short name", &self.short_name),
            ("Currency", &self.currency),
            ("Exchange", &self.exchange_name),
            ("Type", &self.instrument_type),
            ("Timezone", &self.timezone),
        ];
        for (label, value) in text {
            if let Some(value) = value {
                rows.push((label, value.clone()));
            }
        }
        let numbers = [
            ("Price", self.regular_market_price),
            ("52w high", self.fifty_two_week_high),
            ("52w low", self.fifty_two_week_low),
        ];
        for (label, value) in numbers {
            if let Some(value) = value {
                rows.push((label, format!("{:.2}", value)));
            }
        }
        rows
    }
}
