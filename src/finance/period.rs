//! Reporting windows for the analytics endpoints. Unknown period names fall
//! back to the whole history.

use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Earliest date any window reaches back to.
pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN)
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum AnalyticsPeriod {
    #[strum(serialize = "7d")]
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[strum(serialize = "30d")]
    #[serde(rename = "30d")]
    Month,
    #[strum(serialize = "90d")]
    #[serde(rename = "90d")]
    Quarter,
    #[strum(serialize = "all")]
    #[serde(rename = "all")]
    All,
}

impl AnalyticsPeriod {
    /// Missing or empty means the default window; anything unrecognised means `All`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.filter(|raw| !raw.is_empty()) {
            None => Self::default(),
            Some(raw) => Self::from_str(raw).unwrap_or(Self::All),
        }
    }

    pub fn start(self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Week => today - Duration::days(7),
            Self::Month => today - Duration::days(30),
            Self::Quarter => today - Duration::days(90),
            Self::All => epoch(),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OwnerPeriod {
    #[default]
    Today,
    Week,
    /// Calendar month to date.
    Month,
    All,
}

impl OwnerPeriod {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.filter(|raw| !raw.is_empty()) {
            None => Self::default(),
            Some(raw) => Self::from_str(raw).unwrap_or(Self::All),
        }
    }

    pub fn start(self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Today => today,
            Self::Week => today - Duration::days(7),
            Self::Month => today.with_day(1).unwrap_or(today),
            Self::All => epoch(),
        }
    }
}

/// Window echoed back with analytics responses.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct DateRange {
    #[schema(value_type = String, format = "date")]
    pub from: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub to: NaiveDate,
}
