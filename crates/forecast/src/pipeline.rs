use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use history_model::{Action, HistoryEntry, Prediction};
use log::debug;

use crate::autoreg::AutoReg;
use crate::error::ForecastError;

/// Relative move of the last forecast point needed to leave `Hold`.
const ACTION_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub date: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSettings {
    pub lags: usize,
    pub train_ratio: f64,
    pub horizon: usize,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        ForecastSettings {
            lags: 5,
            train_ratio: 0.8,
            horizon: 30,
        }
    }
}

/// Everything one pipeline run produces for a single series.
#[derive(Debug, Clone)]
pub struct ForecastOutput {
    pub train: Vec<Point>,
    pub test: Vec<Point>,
    pub predictions: Vec<Point>,
    pub forecast: Vec<Point>,
    pub model: AutoReg,
    pub prediction: Prediction,
}

/// Splits `items` at `floor(len * ratio)`.
pub fn split<T>(items: &[T], ratio: f64) -> (&[T], &[T]) {
    let at = ((items.len() as f64) * ratio).floor() as usize;
    items.split_at(at.min(items.len()))
}

pub struct ForecastPipeline {
    settings: ForecastSettings,
}

impl ForecastPipeline {
    pub fn new(settings: ForecastSettings) -> Result<Self, ForecastError> {
        if !(settings.train_ratio > 0.0 && settings.train_ratio < 1.0) {
            return Err(ForecastError::InvalidSettings(format!(
                "train ratio {} is outside (0, 1)",
                settings.train_ratio
            )));
        }
        if settings.lags == 0 {
            return Err(ForecastError::InvalidSettings(
                "lag count must be positive".to_string(),
            ));
        }
        Ok(ForecastPipeline { settings })
    }

    pub fn run(&self, history: &[HistoryEntry]) -> Result<ForecastOutput, ForecastError> {
        let (train, test) = split(history, self.settings.train_ratio);
        if test.is_empty() {
            return Err(ForecastError::InsufficientData {
                needed: history.len() + 1,
                got: history.len(),
            });
        }

        let closes: Vec<f64> = history.iter().map(|e| e.close).collect();

        debug!(
            "run | observations: {} | train: {} | test: {}",
            closes.len(),
            train.len(),
            test.len()
        );

        let train_model = AutoReg::fit(&closes[..train.len()], self.settings.lags)?;
        let predicted = train_model.predict(&closes, train.len())?;

        let model = AutoReg::fit(&closes, self.settings.lags)?;
        let projected = model.forecast(&closes, self.settings.horizon)?;

        let last = &history[history.len() - 1];
        let action = match projected.last() {
            Some(value) => action_for(last.close, *value),
            None => Action::Hold,
        };
        let actual: Vec<f64> = test.iter().map(|e| e.close).collect();
        let prediction = Prediction {
            action,
            accuracy: accuracy(&actual, &predicted),
        };

        let forecast = next_business_days(last.date, projected.len())
            .into_iter()
            .zip(projected)
            .map(|(date, value)| Point { date, value })
            .collect();

        Ok(ForecastOutput {
            train: to_points(train),
            test: to_points(test),
            predictions: test
                .iter()
                .zip(predicted)
                .map(|(e, value)| Point {
                    date: e.date,
                    value,
                })
                .collect(),
            forecast,
            model,
            prediction,
        })
    }
}

fn to_points(entries: &[HistoryEntry]) -> Vec<Point> {
    entries
        .iter()
        .map(|e| Point {
            date: e.date,
            value: e.close,
        })
        .collect()
}

fn action_for(last_close: f64, last_forecast: f64) -> Action {
    if last_close == 0.0 {
        return Action::Hold;
    }
    let change = (last_forecast - last_close) / last_close;
    if change > ACTION_THRESHOLD {
        Action::Buy
    } else if change < -ACTION_THRESHOLD {
        Action::Sell
    } else {
        Action::Hold
    }
}

/// `100 - MAPE`, clamped to a percentage.
fn accuracy(actual: &[f64], predicted: &[f64]) -> u8 {
    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| **a != 0.0)
        .map(|(a, p)| ((a - p) / a).abs() * 100.0)
        .collect();
    if errors.is_empty() {
        return 0;
    }
    let mape = errors.iter().sum::<f64>() / errors.len() as f64;
    (100.0 - mape).clamp(0.0, 100.0).round() as u8
}

fn next_business_days(after: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
    let mut dates = Vec::with_capacity(count);
    let mut date = after;
    while dates.len() < count {
        date += Duration::days(1);
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(date);
        }
    }
    dates
}
