//! Cost selector shared by the routing and centrality crates.

use std::str::FromStr;

use crate::CoreError;

/// Which edge attribute a search sums as its cost.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Metric {
    /// Physical length in metres.
    #[default]
    Length,
    /// Free-flow travel time in seconds.
    TravelTime,
}

impl Metric {
    /// Label used on the command line and in log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Length     => "length",
            Metric::TravelTime => "travel_time",
        }
    }

    /// Unit suffix of costs computed under this metric.
    pub fn unit(self) -> &'static str {
        match self {
            Metric::Length     => "m",
            Metric::TravelTime => "s",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "length"      => Ok(Metric::Length),
            "travel_time" => Ok(Metric::TravelTime),
            other => Err(CoreError::Parse(format!(
                "unknown metric {other:?}: expected \"length\" or \"travel_time\""
            ))),
        }
    }
}
