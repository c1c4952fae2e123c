use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two daily conditions was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachKind {
    /// The end-of-day extrapolation exceeded the threshold
    Forecast,
    /// The observed cumulative value exceeded the threshold
    Volume,
}

impl BreachKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreachKind::Forecast => "forecast",
            BreachKind::Volume => "volume",
        }
    }
}

impl fmt::Display for BreachKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A threshold crossing that must be reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdBreach {
    pub kind: BreachKind,
    pub value: i64,
    pub threshold: i64,
}
