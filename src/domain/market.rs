//! Market timing: which price convention applies right now.

use chrono::{Datelike, NaiveDateTime, NaiveTime};

use super::position::EntryType;

/// Regular session boundaries, local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl Default for MarketHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
        }
    }
}

/// Market state at a point in time and the entry-price convention it
/// implies.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketStatus {
    pub is_open: bool,
    pub price_type: EntryType,
    pub description: String,
}

/// Classify `now` against the session boundaries.
///
/// Weekend and pre-market fall back to the previous close, after hours
/// uses today's close, and the open session uses today's open.
pub fn market_status_at(now: NaiveDateTime, hours: &MarketHours) -> MarketStatus {
    let weekday = now.date().weekday().num_days_from_monday();
    if weekday >= 5 {
        return MarketStatus {
            is_open: false,
            price_type: EntryType::PreviousClose,
            description: "Weekend - using Friday close".into(),
        };
    }

    let time = now.time();
    if time < hours.open {
        MarketStatus {
            is_open: false,
            price_type: EntryType::PreviousClose,
            description: "Pre-market - using previous close".into(),
        }
    } else if time >= hours.close {
        MarketStatus {
            is_open: false,
            price_type: EntryType::Close,
            description: "After hours - using today close".into(),
        }
    } else {
        MarketStatus {
            is_open: true,
            price_type: EntryType::Open,
            description: "Market open - using today open".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn weekend_uses_previous_close() {
        // 2025-01-11 is a Saturday.
        let status = market_status_at(at(2025, 1, 11, 12, 0), &MarketHours::default());
        assert!(!status.is_open);
        assert_eq!(status.price_type, EntryType::PreviousClose);
        assert_eq!(status.description, "Weekend - using Friday close");
    }

    #[test]
    fn pre_market_uses_previous_close() {
        let status = market_status_at(at(2025, 1, 10, 8, 0), &MarketHours::default());
        assert!(!status.is_open);
        assert_eq!(status.price_type, EntryType::PreviousClose);
    }

    #[test]
    fn intraday_uses_today_open() {
        let status = market_status_at(at(2025, 1, 10, 10, 30), &MarketHours::default());
        assert!(status.is_open);
        assert_eq!(status.price_type, EntryType::Open);
        assert_eq!(status.description, "Market open - using today open");
    }

    #[test]
    fn after_hours_uses_today_close() {
        let status = market_status_at(at(2025, 1, 10, 16, 0), &MarketHours::default());
        assert!(!status.is_open);
        assert_eq!(status.price_type, EntryType::Close);
    }

    #[test]
    fn session_boundaries_are_inclusive_open_exclusive_close() {
        let hours = MarketHours::default();
        assert!(market_status_at(at(2025, 1, 10, 9, 30), &hours).is_open);
        assert!(!market_status_at(at(2025, 1, 10, 9, 29), &hours).is_open);
        assert!(!market_status_at(at(2025, 1, 10, 16, 0), &hours).is_open);
    }
}
