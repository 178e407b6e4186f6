//! Canonical `YYYY-MM-DD` day keys.
//!
//! Every per-day record (overrides, food logs, workout progress) is addressed
//! by the same key, so the rendering here has to be bit-exact.

use crate::{Error, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const FORMAT: &str = "%Y-%m-%d";

/// A calendar day in the local calendar, rendered as `YYYY-MM-DD`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Today's key from the local wall-clock date (no timezone normalization)
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// Parse a key, rejecting anything that is not already canonical
    /// (`2025-1-5` parses as a date but would never match a stored key).
    pub fn parse(s: &str) -> Result<Self> {
        let date = NaiveDate::parse_from_str(s, FORMAT)
            .map_err(|_| Error::InvalidDateKey(s.to_string()))?;
        let key = Self(date);
        if key.to_string() != s {
            return Err(Error::InvalidDateKey(s.to_string()));
        }
        Ok(key)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl TryFrom<String> for DateKey {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_zero_padded_rendering() {
        let key = DateKey::from_date(NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
        assert_eq!(key.to_string(), "2025-01-05");
    }

    #[test]
    fn test_parse_rejects_non_canonical() {
        assert!(DateKey::parse("2025-01-05").is_ok());
        assert!(DateKey::parse("2025-1-5").is_err());
        assert!(DateKey::parse("2025-02-30").is_err());
        assert!(DateKey::parse("not a date").is_err());
    }

    #[test]
    fn test_json_map_key() {
        let mut map = BTreeMap::new();
        map.insert(DateKey::parse("2025-01-02").unwrap(), "Legs".to_string());

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"2025-01-02":"Legs"}"#);

        let parsed: BTreeMap<DateKey, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, map);
    }

    #[test]
    fn test_malformed_json_key_rejected() {
        let result: std::result::Result<BTreeMap<DateKey, String>, _> =
            serde_json::from_str(r#"{"2025-1-2":"Legs"}"#);
        assert!(result.is_err());
    }
}
