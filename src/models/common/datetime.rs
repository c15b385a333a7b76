//! 日期时间解析辅助
//!
//! 截止时间、考试开始时间按机构本地墙上时间保存，不带时区。

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::errors::PortalError;

/// 解析 `HH:MM` 或 `HH:MM:SS`
pub fn parse_time(value: &str) -> Result<NaiveTime, PortalError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(PortalError::from)
}

/// 解析 `YYYY-MM-DD`
pub fn parse_date(value: &str) -> Result<NaiveDate, PortalError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(PortalError::from)
}

pub fn deserialize_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_time(&s).map_err(|e| serde::de::Error::custom(e.message().to_string()))
}

pub fn deserialize_option_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => parse_time(&s)
            .map(Some)
            .map_err(|e| serde::de::Error::custom(e.message().to_string())),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_accepts_both_forms() {
        assert_eq!(
            parse_time("18:00").unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap()
        );
        assert_eq!(
            parse_time("07:05:30").unwrap(),
            NaiveTime::from_hms_opt(7, 5, 30).unwrap()
        );
        assert!(parse_time("25:00").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-01-10").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
        assert_eq!(parse_date("10/01/2025").unwrap_err().code(), "E011");
    }
}
