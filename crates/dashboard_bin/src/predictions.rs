use history_model::{Action, Prediction, STOCKS, Stock};
use rand::Rng;
use std::collections::BTreeMap;

const MIN_ACCURACY: u8 = 70;
const MAX_ACCURACY: u8 = 100;

pub struct StockPredictions {
    pub stock: &'static Stock,
    pub records: BTreeMap<Action, Prediction>,
}

/// Mock predictions for the dashboard tickers: every action of every stock
/// gets an independent, uniformly drawn accuracy.
pub fn get_predictions<R: Rng + ?Sized>(rng: &mut R) -> Vec<StockPredictions> {
    STOCKS
        .iter()
        .map(|stock| StockPredictions {
            stock,
            records: Action::ALL
                .into_iter()
                .map(|action| {
                    let accuracy = rng.gen_range(MIN_ACCURACY..=MAX_ACCURACY);
                    (action, Prediction { action, accuracy })
                })
                .collect(),
        })
        .collect()
}
