use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

/// Span of history requested from the market-data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    pub const ALL: [Period; 11] = [
        Period::OneDay,
        Period::FiveDays,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::TenYears,
        Period::YearToDate,
        Period::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::YearToDate => "ytd",
            Period::Max => "max",
        }
    }

    /// Upper bound of calendar days covered as of `today`, `None` for the
    /// whole history.
    pub fn max_days(&self, today: NaiveDate) -> Option<u32> {
        match self {
            Period::OneDay => Some(1),
            Period::FiveDays => Some(5),
            Period::OneMonth => Some(31),
            Period::ThreeMonths => Some(92),
            Period::SixMonths => Some(184),
            Period::OneYear => Some(366),
            Period::YearToDate => Some(today.ordinal()),
            Period::TwoYears => Some(731),
            Period::FiveYears => Some(1827),
            Period::TenYears => Some(3653),
            Period::Max => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParseError {
                kind: "period",
                value: s.to_string(),
            })
    }
}

/// Bar size of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1wk")]
    OneWeek,
    #[serde(rename = "1mo")]
    OneMonth,
}

impl Interval {
    pub const ALL: [Interval; 8] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::OneHour,
        Interval::OneDay,
        Interval::OneWeek,
        Interval::OneMonth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::ThirtyMinutes => "30m",
            Interval::OneHour => "1h",
            Interval::OneDay => "1d",
            Interval::OneWeek => "1wk",
            Interval::OneMonth => "1mo",
        }
    }

    /// How far back the upstream serves bars of this size, in days.
    pub fn max_lookback_days(&self) -> Option<u32> {
        match self {
            Interval::OneMinute => Some(7),
            Interval::FiveMinutes | Interval::FifteenMinutes | Interval::ThirtyMinutes => Some(60),
            Interval::OneHour => Some(730),
            Interval::OneDay | Interval::OneWeek | Interval::OneMonth => None,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| ParseError {
                kind: "interval",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_display_matches_serde_name() {
        for period in Period::ALL {
            let json = serde_json::to_string(&period).unwrap();
            assert_eq!(json, format!("\"{}\"", period));
        }
    }

    #[test]
    fn interval_display_matches_serde_name() {
        for interval in Interval::ALL {
            let json = serde_json::to_string(&interval).unwrap();
            assert_eq!(json, format!("\"{}\"", interval));
        }
    }

    #[test]
    fn parse_known_values() {
        assert_eq!("ytd".parse::<Period>(), Ok(Period::YearToDate));
        assert_eq!("1wk".parse::<Interval>(), Ok(Interval::OneWeek));
    }

    #[test]
    fn parse_unknown_values_fail() {
        let err = "2d".parse::<Period>().unwrap_err();
        assert_eq!(err.to_string(), "unknown period: \"2d\"");
        assert!("90m".parse::<Interval>().is_err());
    }

    #[test]
    fn max_period_is_unbounded() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(Period::Max.max_days(today), None);
        assert!(Period::TenYears.max_days(today) > Period::FiveYears.max_days(today));
    }

    #[test]
    fn year_to_date_grows_through_the_year() {
        let january = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        let december = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(Period::YearToDate.max_days(january), Some(20));
        assert_eq!(Period::YearToDate.max_days(december), Some(366));
    }

    #[test]
    fn intraday_intervals_have_lookback() {
        assert_eq!(Interval::OneMinute.max_lookback_days(), Some(7));
        assert_eq!(Interval::OneDay.max_lookback_days(), None);
    }
}
