//! 时间类型模块
//!
//! 后端以 ISO-8601 字符串传输时间，客户端内部统一使用 `DateTime<Utc>`：
//! - `TimeInput`: 写入侧的时间输入，可以是已解析的时间或待解析的字符串
//! - `to_iso_string` / `parse_instant`: 字符串与时间值之间的转换
//! - `iso`: 供 `#[serde(with = ...)]` 使用的序列化模块

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// 无时区的日期时间格式，按 UTC 解释
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// 格式化为带毫秒与 `Z` 后缀的 ISO-8601 字符串，例如 `2024-03-05T10:00:00.000Z`
pub fn to_iso_string(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 解析时间字符串
///
/// 依次尝试 RFC 3339、无时区日期时间（按 UTC）、纯日期（UTC 零点）。
/// 返回 None 如果解析失败
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// 从毫秒时间戳创建
pub fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

// =========================================================
// TimeInput - 写入侧时间输入
// =========================================================

/// 写入接口接受的时间：既可以是时间值，也可以是可解析的字符串
///
/// 不带时区的文本（如 `2024-03-06T07:30`）一律按 UTC 解释，不会套用本地时区。
/// 持有本地挂钟时间的调用方应先换算为 `DateTime<Utc>`，再以 `Instant` 传入。
#[derive(Debug, Clone, PartialEq)]
pub enum TimeInput {
    Instant(DateTime<Utc>),
    Text(String),
}

impl TimeInput {
    /// 解析为时间值，字符串无法解析时返回 None
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            TimeInput::Instant(dt) => Some(*dt),
            TimeInput::Text(s) => parse_instant(s),
        }
    }

    /// 空串或仅含空白的文本
    pub fn is_blank(&self) -> bool {
        matches!(self, TimeInput::Text(s) if s.trim().is_empty())
    }

    /// 解析并格式化为 ISO-8601 字符串
    pub fn to_iso_string(&self) -> Option<String> {
        self.resolve().map(|dt| to_iso_string(&dt))
    }
}

impl From<DateTime<Utc>> for TimeInput {
    fn from(dt: DateTime<Utc>) -> Self {
        TimeInput::Instant(dt)
    }
}

impl From<String> for TimeInput {
    fn from(s: String) -> Self {
        TimeInput::Text(s)
    }
}

impl From<&str> for TimeInput {
    fn from(s: &str) -> Self {
        TimeInput::Text(s.to_string())
    }
}

// =========================================================
// serde 辅助模块
// =========================================================

/// 以 ISO 字符串序列化；反序列化时接受 ISO 字符串或毫秒时间戳
pub mod iso {
    use chrono::{DateTime, Utc};
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_iso_string(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        deserializer.deserialize_any(InstantVisitor)
    }

    struct InstantVisitor;

    impl<'de> Visitor<'de> for InstantVisitor {
        type Value = DateTime<Utc>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an ISO-8601 string or a millisecond timestamp")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            super::parse_instant(v).ok_or_else(|| E::custom(format!("invalid date: {v}")))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            super::from_millis(v).ok_or_else(|| E::custom(format!("timestamp out of range: {v}")))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            let ms = i64::try_from(v).map_err(|_| E::custom("timestamp out of range"))?;
            self.visit_i64(ms)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            if !v.is_finite() {
                return Err(E::custom("timestamp is not finite"));
            }
            self.visit_i64(v as i64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso_string_has_millis_and_z() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        assert_eq!(to_iso_string(&dt), "2024-03-05T10:00:00.000Z");
    }

    #[test]
    fn test_parse_offsets_normalize_to_utc() {
        let dt = parse_instant("2024-03-05T12:00:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_datetime_local_and_date_only() {
        // <input type="datetime-local"> 的格式
        let dt = parse_instant("2024-03-05T10:30").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap());

        let day = parse_instant("2024-03-05").unwrap();
        assert_eq!(day, Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_zoneless_text_input_is_utc() {
        let input = TimeInput::from("2024-03-06T07:30");
        assert_eq!(input.to_iso_string().as_deref(), Some("2024-03-06T07:30:00.000Z"));

        let offset = TimeInput::from("2024-03-06T07:30:00-05:00");
        assert_eq!(offset.to_iso_string().as_deref(), Some("2024-03-06T12:30:00.000Z"));

        assert!(TimeInput::from("  ").is_blank());
        assert!(!TimeInput::from("2024-03-06").is_blank());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_instant("").is_none());
        assert!(parse_instant("next tuesday").is_none());
        assert!(TimeInput::from("2024-13-40").resolve().is_none());
    }
}
