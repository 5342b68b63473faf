use time::{Date, Duration, OffsetDateTime};

/// Look-back window for history reads, anchored on today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    All,
    Week,
    Month,
    Year,
}

impl TimeRange {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Some(TimeRange::All),
            "week" => Some(TimeRange::Week),
            "month" => Some(TimeRange::Month),
            "year" => Some(TimeRange::Year),
            _ => None,
        }
    }

    pub fn days(self) -> Option<i64> {
        match self {
            TimeRange::All => None,
            TimeRange::Week => Some(7),
            TimeRange::Month => Some(30),
            TimeRange::Year => Some(365),
        }
    }

    /// First day included by this range; the boundary day itself is kept.
    pub fn since(self, today: Date) -> Option<Date> {
        self.days().map(|d| days_before(today, d))
    }
}

pub fn days_before(today: Date, days: i64) -> Date {
    today.saturating_sub(Duration::days(days))
}

/// Server-clock date used for every window computation.
pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}
