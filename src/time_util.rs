use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer};
use std::cmp::Ordering;
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A reservation moment as written in the dataset.
///
/// Plain dates sort as midnight. Equality and ordering look only at the
/// moment; whether a time was written only affects how it is displayed.
#[derive(Debug, Clone, Copy)]
pub struct DatasetDate {
    moment: NaiveDateTime,
    has_time: bool,
}

impl DatasetDate {
    pub fn from_date(date: NaiveDate) -> Self {
        DatasetDate {
            moment: date.and_time(NaiveTime::MIN),
            has_time: false,
        }
    }

    pub fn from_datetime(moment: NaiveDateTime) -> Self {
        DatasetDate {
            moment,
            has_time: true,
        }
    }

    /// Calendar date, used for profiles and date filters.
    pub fn date(&self) -> NaiveDate {
        self.moment.date()
    }

    pub fn moment(&self) -> NaiveDateTime {
        self.moment
    }
}

impl PartialEq for DatasetDate {
    fn eq(&self, other: &Self) -> bool {
        self.moment == other.moment
    }
}

impl Eq for DatasetDate {}

impl PartialOrd for DatasetDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DatasetDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.moment.cmp(&other.moment)
    }
}

impl fmt::Display for DatasetDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_time {
            write!(f, "{}", self.moment)
        } else {
            write!(f, "{}", self.moment.date().format(DATE_FORMAT))
        }
    }
}

/// Parse a dataset date.
///
/// Accepts a plain `YYYY-MM-DD` date or an ISO-style date-time
/// (`YYYY-MM-DDTHH:MM:SS`, optionally with fractional seconds, or the same
/// with a space separator).
pub fn parse_dataset_date(value: &str) -> Result<DatasetDate, anyhow::Error> {
    let trimmed = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(DatasetDate::from_date(date));
    }

    for format in DATETIME_FORMATS {
        if let Ok(moment) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(DatasetDate::from_datetime(moment));
        }
    }

    Err(anyhow::anyhow!("Failed to parse date: {}", value))
}

/// Render a date the way profiles carry it (`YYYY-MM-DD`).
pub fn format_profile_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// serde adapter for [`parse_dataset_date`].
pub fn deserialize_dataset_date<'de, D>(
    deserializer: D,
) -> Result<DatasetDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_dataset_date(&raw).map_err(serde::de::Error::custom)
}
