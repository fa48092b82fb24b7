use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, Weekday};

use crate::ValidationError;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Calendar date in ISO `YYYY-MM-DD` form.
///
/// A `TradeDate` is only a calendar day; whether the market was actually
/// open on it is decided by the presence of price data, not by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeDate(Date);

impl TradeDate {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), DATE_FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    pub fn from_date(date: Date) -> Self {
        Self(date)
    }

    pub fn as_date(self) -> Date {
        self.0
    }

    /// The following calendar day.
    pub fn next(self) -> Self {
        Self(self.0 + Duration::days(1))
    }

    pub fn is_weekend(self) -> bool {
        matches!(self.0.weekday(), Weekday::Saturday | Weekday::Sunday)
    }

    /// Seconds since the Unix epoch at midnight UTC of this date.
    pub fn unix_midnight(self) -> i64 {
        self.0.midnight().assume_utc().unix_timestamp()
    }

    /// Every calendar day from `start` through `end`, inclusive.
    pub fn range_inclusive(start: Self, end: Self) -> Result<Vec<Self>, ValidationError> {
        if start > end {
            return Err(ValidationError::ReversedDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let mut days = Vec::new();
        let mut current = start;
        while current <= end {
            days.push(current);
            current = current.next();
        }
        Ok(days)
    }
}

impl Display for TradeDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let formatted = self
            .0
            .format(DATE_FORMAT)
            .expect("trade date must be formattable");
        f.write_str(&formatted)
    }
}

impl Serialize for TradeDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TradeDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_iso_date() {
        let date = TradeDate::parse("2025-01-06").expect("must parse");
        assert_eq!(date.to_string(), "2025-01-06");
    }

    #[test]
    fn rejects_malformed_date() {
        let err = TradeDate::parse("06/01/2025").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
    }

    #[test]
    fn inclusive_range_covers_both_endpoints() {
        let start = TradeDate::parse("2025-01-30").expect("must parse");
        let end = TradeDate::parse("2025-02-02").expect("must parse");
        let days = TradeDate::range_inclusive(start, end).expect("range");
        let rendered: Vec<String> = days.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["2025-01-30", "2025-01-31", "2025-02-01", "2025-02-02"]
        );
    }

    #[test]
    fn reversed_range_is_rejected() {
        let start = TradeDate::parse("2025-02-02").expect("must parse");
        let end = TradeDate::parse("2025-01-30").expect("must parse");
        let err = TradeDate::range_inclusive(start, end).expect_err("must fail");
        assert!(matches!(err, ValidationError::ReversedDateRange { .. }));
    }

    #[test]
    fn weekend_detection() {
        // 2025-01-04 was a Saturday.
        assert!(TradeDate::parse("2025-01-04").unwrap().is_weekend());
        assert!(!TradeDate::parse("2025-01-06").unwrap().is_weekend());
    }
}
