//! Type identifiers and temporal types for Tessera column values.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds per day.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Identifier for all column types supported by Tessera.
///
/// Type IDs tag type-erased columns and select the specialization the index
/// factory builds for a key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TypeId {
    // Null type
    Null = 0,

    // Boolean
    Boolean = 1,

    // Integer types
    Int8 = 10,
    Int16 = 11,
    Int32 = 12,
    Int64 = 13,

    // Unsigned integer types
    UInt8 = 20,
    UInt16 = 21,
    UInt32 = 22,
    UInt64 = 23,

    // Floating point types
    Float32 = 30,
    Float64 = 31,

    // String types
    Text = 52,

    // Binary types
    Binary = 60,

    // Date/Time types
    Date = 70,
    Timestamp = 72,
}

impl TypeId {
    /// Returns true for value types, whose columns are null-wrapped by default.
    ///
    /// Value types have a zero value that is distinct from NULL, so their
    /// columns store `Option<T>` to keep the two apart.
    pub fn is_value_type(&self) -> bool {
        !matches!(self, TypeId::Null | TypeId::Text | TypeId::Binary)
    }

    /// All key types the index factory knows how to build.
    pub const KEY_TYPES: [TypeId; 15] = [
        TypeId::Boolean,
        TypeId::Int8,
        TypeId::Int16,
        TypeId::Int32,
        TypeId::Int64,
        TypeId::UInt8,
        TypeId::UInt16,
        TypeId::UInt32,
        TypeId::UInt64,
        TypeId::Float32,
        TypeId::Float64,
        TypeId::Text,
        TypeId::Binary,
        TypeId::Date,
        TypeId::Timestamp,
    ];
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TypeId::Null => "NULL",
            TypeId::Boolean => "BOOLEAN",
            TypeId::Int8 => "INT8",
            TypeId::Int16 => "INT16",
            TypeId::Int32 => "INT32",
            TypeId::Int64 => "INT64",
            TypeId::UInt8 => "UINT8",
            TypeId::UInt16 => "UINT16",
            TypeId::UInt32 => "UINT32",
            TypeId::UInt64 => "UINT64",
            TypeId::Float32 => "FLOAT32",
            TypeId::Float64 => "FLOAT64",
            TypeId::Text => "TEXT",
            TypeId::Binary => "BINARY",
            TypeId::Date => "DATE",
            TypeId::Timestamp => "TIMESTAMP",
        };
        write!(f, "{}", name)
    }
}

/// Days from 0001-01-01 (day 1 of the common era) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Calendar date stored as days since 1970-01-01.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Date(pub i32);

impl Date {
    /// The epoch date, 1970-01-01.
    pub const EPOCH: Date = Date(0);

    pub fn from_naive(date: NaiveDate) -> Self {
        Date(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
    }

    /// Returns the calendar date, or `None` outside chrono's supported range.
    pub fn to_naive(&self) -> Option<NaiveDate> {
        self.0
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
    }

    /// Parses `YYYY-MM-DD`.
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .ok()
            .map(Self::from_naive)
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_naive() {
            Some(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            None => write!(f, "{} days", self.0),
        }
    }
}

/// Layouts accepted for timestamps without a UTC offset.
const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Point in time stored as milliseconds since the Unix epoch (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Returns the calendar date containing this instant.
    pub fn date(&self) -> Date {
        Date(self.0.div_euclid(MILLIS_PER_DAY) as i32)
    }

    /// Returns the instant in UTC, or `None` outside chrono's supported range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.0)
    }

    /// Parses an ISO-8601 / RFC 3339 timestamp.
    ///
    /// Accepts a bare date, a date and time separated by `T` or a space, and
    /// an optional `Z` or `+HH:MM` offset. Times without an offset are UTC.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Timestamp(dt.timestamp_millis()));
        }
        if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
            return Some(Timestamp(dt.timestamp_millis()));
        }
        NAIVE_TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|dt| Timestamp(dt.and_utc().timestamp_millis()))
            .or_else(|| Date::parse(s).map(Timestamp::from))
    }
}

impl From<Date> for Timestamp {
    fn from(date: Date) -> Self {
        Timestamp(date.0 as i64 * MILLIS_PER_DAY)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            None => write!(f, "{} ms", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert!(TypeId::Int32.is_value_type());
        assert!(TypeId::Boolean.is_value_type());
        assert!(TypeId::Float64.is_value_type());
        assert!(TypeId::Date.is_value_type());
        assert!(TypeId::Timestamp.is_value_type());

        assert!(!TypeId::Text.is_value_type());
        assert!(!TypeId::Binary.is_value_type());
        assert!(!TypeId::Null.is_value_type());
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeId::Null.to_string(), "NULL");
        assert_eq!(TypeId::Int64.to_string(), "INT64");
        assert_eq!(TypeId::Text.to_string(), "TEXT");
        assert_eq!(TypeId::Timestamp.to_string(), "TIMESTAMP");
    }

    #[test]
    fn test_key_types_exclude_null() {
        assert!(!TypeId::KEY_TYPES.contains(&TypeId::Null));
        assert_eq!(TypeId::KEY_TYPES.len(), 15);
    }

    #[test]
    fn test_date_conversions() {
        let ymd = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(Date::from_naive(ymd(1970, 1, 1)), Date::EPOCH);
        assert_eq!(Date::from_naive(ymd(2000, 3, 1)).0, 11_017);
        assert_eq!(Date(11_017).to_naive(), Some(ymd(2000, 3, 1)));
        assert_eq!(Date(-1).to_naive(), Some(ymd(1969, 12, 31)));
        assert_eq!(Date(i32::MAX).to_naive(), None);

        let date = Date::parse("2024-02-29").unwrap();
        assert_eq!(date.to_string(), "2024-02-29");
        assert!(Date::parse("2023-02-29").is_none());
        assert!(Date::parse("2023-13-01").is_none());
        assert!(Date::parse("garbage").is_none());
    }

    #[test]
    fn test_timestamp_parse_and_display() {
        let ts = Timestamp::parse("1970-01-02 00:00:01").unwrap();
        assert_eq!(ts.0, MILLIS_PER_DAY + 1000);
        assert_eq!(ts.to_string(), "1970-01-02 00:00:01");

        let ts = Timestamp::parse("2001-09-09T01:46:40").unwrap();
        assert_eq!(ts.0, 1_000_000_000_000);
        assert_eq!(Timestamp(1_500).to_string(), "1970-01-01 00:00:01.500");

        assert_eq!(Timestamp::parse("1970-01-01"), Some(Timestamp::EPOCH));
        assert_eq!(Timestamp::parse("1970-01-01 00:01"), Some(Timestamp(60_000)));
        assert!(Timestamp::parse("1970-01-01 25:00:00").is_none());
        assert_eq!(Timestamp(-1).date(), Date(-1));
    }

    #[test]
    fn test_timestamp_parse_with_offset() {
        let utc = Timestamp::parse("2024-01-15T10:00:00Z").unwrap();
        assert_eq!(utc, Timestamp::parse("2024-01-15 10:00:00").unwrap());

        let plus_two = Timestamp::parse("2024-01-15T12:00:00+02:00").unwrap();
        assert_eq!(plus_two, utc);
        let spaced = Timestamp::parse("2024-01-15 12:00:00.250+02:00").unwrap();
        assert_eq!(spaced.0, utc.0 + 250);
    }

    #[test]
    fn test_serde_roundtrip() {
        let original = TypeId::Timestamp;
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: TypeId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(original, deserialized);
    }
}
