use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading recommendation attached to a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Hold,
    Sell,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Buy, Action::Hold, Action::Sell];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "Buy",
            Action::Hold => "Hold",
            Action::Sell => "Sell",
        }
    }

    /// Badge background used when rendering the action.
    pub fn color(&self) -> &'static str {
        match self {
            Action::Buy => "green",
            Action::Hold => "blue",
            Action::Sell => "red",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An action together with its accuracy in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub action: Action,
    pub accuracy: u8,
}
