use jiff::{SignedDuration, Timestamp};

pub type DateTime = Timestamp;
pub type Duration = SignedDuration;

/// Thin wrapper over `jiff` so models and services share one clock API.
pub struct DateUtil;

impl DateUtil {
    pub fn now() -> DateTime {
        Timestamp::now()
    }

    pub fn to_rfc3339(dt: &DateTime) -> String {
        dt.to_string()
    }

    /// Unix timestamp in seconds
    pub fn to_timestamp(dt: &DateTime) -> i64 {
        dt.as_second()
    }

    pub fn from_timestamp(timestamp: i64) -> Result<DateTime, jiff::Error> {
        Timestamp::from_second(timestamp)
    }

    pub fn hours(hours: i64) -> Duration {
        SignedDuration::from_hours(hours)
    }

    pub fn add_duration(dt: &DateTime, duration: Duration) -> Result<DateTime, jiff::Error> {
        dt.checked_add(duration)
    }

    /// True once `dt` is reached.
    pub fn is_past(dt: &DateTime) -> bool {
        dt <= &Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_hours() {
        let now = DateUtil::now();
        let later = DateUtil::add_duration(&now, DateUtil::hours(2)).unwrap();

        assert_eq!(DateUtil::to_timestamp(&later) - DateUtil::to_timestamp(&now), 7200);
        assert!(!DateUtil::is_past(&later));
    }

    #[test]
    fn test_timestamp_formatting() {
        let parsed = DateUtil::from_timestamp(1_740_830_400).unwrap();
        assert_eq!(DateUtil::to_rfc3339(&parsed), "2025-03-01T12:00:00Z");
        assert_eq!(DateUtil::to_timestamp(&parsed), 1_740_830_400);
    }
}
