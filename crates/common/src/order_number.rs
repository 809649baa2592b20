//! Daily order numbering.
//!
//! Order numbers have the shape `NSI-YYYYMMDD-NNNN`: a fixed prefix, the
//! calendar day, and a four-digit zero-padded sequence that restarts at
//! `0001` each day. Because the suffix has a fixed width, the
//! lexicographically greatest number sharing a day prefix is also the
//! numerically greatest, which is what allocation relies on.
//!
//! The sequence is capped at 9999 per day; allocation past the cap is
//! rejected rather than widened or wrapped.

use chrono::NaiveDate;
use thiserror::Error;

/// Fixed order-number prefix.
pub const PREFIX: &str = "NSI";

/// Highest sequence number a single day can hold.
pub const MAX_SEQUENCE: u32 = 9999;

/// Errors raised while parsing or allocating order numbers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderNumberError {
    #[error("malformed order number: {0}")]
    Malformed(String),

    #[error("order number sequence exhausted for prefix {0}")]
    SequenceExhausted(String),
}

/// A validated order number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Builds the day-scoped prefix, e.g. `NSI-20260807-`.
    pub fn day_prefix(day: NaiveDate) -> String {
        format!("{PREFIX}-{}-", day.format("%Y%m%d"))
    }

    /// Renders the number for a day and sequence.
    ///
    /// Fails with [`OrderNumberError::SequenceExhausted`] when the
    /// sequence would not fit in four digits.
    pub fn from_parts(day: NaiveDate, sequence: u32) -> Result<Self, OrderNumberError> {
        if sequence == 0 || sequence > MAX_SEQUENCE {
            return Err(OrderNumberError::SequenceExhausted(Self::day_prefix(day)));
        }
        Ok(Self(format!("{}{sequence:04}", Self::day_prefix(day))))
    }

    /// Computes the next number for a day given the greatest number already
    /// issued under that day's prefix (`None` when the day has no orders
    /// yet, which starts the sequence at 1).
    pub fn next_for_day(day: NaiveDate, last: Option<&str>) -> Result<Self, OrderNumberError> {
        let sequence = match last {
            None => 1,
            Some(existing) => Self::parse_sequence(day, existing)? + 1,
        };
        Self::from_parts(day, sequence)
    }

    /// Extracts the numeric suffix of a number issued under `day`.
    fn parse_sequence(day: NaiveDate, raw: &str) -> Result<u32, OrderNumberError> {
        let prefix = Self::day_prefix(day);
        let suffix = raw
            .strip_prefix(&prefix)
            .ok_or_else(|| OrderNumberError::Malformed(raw.to_string()))?;
        if suffix.len() != 4 {
            return Err(OrderNumberError::Malformed(raw.to_string()));
        }
        suffix
            .parse::<u32>()
            .map_err(|_| OrderNumberError::Malformed(raw.to_string()))
    }

    /// Wraps a number read back from storage. Storage only ever holds
    /// numbers this module produced, so no re-validation happens here.
    pub fn from_stored(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn day_prefix_format() {
        assert_eq!(OrderNumber::day_prefix(day()), "NSI-20260807-");
    }

    #[test]
    fn first_number_of_the_day() {
        let n = OrderNumber::next_for_day(day(), None).unwrap();
        assert_eq!(n.as_str(), "NSI-20260807-0001");
    }

    #[test]
    fn consecutive_numbers() {
        let first = OrderNumber::next_for_day(day(), None).unwrap();
        let second = OrderNumber::next_for_day(day(), Some(first.as_str())).unwrap();
        assert_eq!(second.as_str(), "NSI-20260807-0002");
        assert!(second > first);
    }

    #[test]
    fn sequence_is_zero_padded() {
        let n = OrderNumber::from_parts(day(), 42).unwrap();
        assert_eq!(n.as_str(), "NSI-20260807-0042");
    }

    #[test]
    fn fixed_width_sorts_numerically() {
        let small = OrderNumber::from_parts(day(), 9).unwrap();
        let large = OrderNumber::from_parts(day(), 1000).unwrap();
        assert!(large.as_str() > small.as_str());
    }

    #[test]
    fn sequence_overflow_is_rejected() {
        let last = OrderNumber::from_parts(day(), MAX_SEQUENCE).unwrap();
        let err = OrderNumber::next_for_day(day(), Some(last.as_str())).unwrap_err();
        assert!(matches!(err, OrderNumberError::SequenceExhausted(_)));
    }

    #[test]
    fn malformed_existing_number_is_rejected() {
        for raw in ["NSI-20260807-12", "NSI-20260807-abcd", "XX-20260807-0001", ""] {
            let err = OrderNumber::next_for_day(day(), Some(raw)).unwrap_err();
            assert!(matches!(err, OrderNumberError::Malformed(_)), "{raw}");
        }
    }

    #[test]
    fn other_days_prefix_is_malformed_for_today() {
        let other = "NSI-20260806-0005";
        let err = OrderNumber::next_for_day(day(), Some(other)).unwrap_err();
        assert!(matches!(err, OrderNumberError::Malformed(_)));
    }
}
