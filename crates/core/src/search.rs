//! Job search and pagination rules shared by every store implementation.

use crate::hiring::Trade;
use crate::types::Timestamp;

/// Width of the hourly-rate band below `max_hourly_rate` that a search matches.
pub const RATE_BAND: f64 = 10.0;

/// Default page size for paginated listings.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size for paginated listings.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Normalised pagination window (1-based page).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    /// Clamp raw query values: page >= 1, 1 <= limit <= [`MAX_PAGE_SIZE`].
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip; saturates for absurdly large page numbers.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total == 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Filters for the "available jobs" search.
#[derive(Debug, Clone, Default)]
pub struct JobSearch {
    pub trade: Option<Trade>,
    pub max_hourly_rate: Option<f64>,
    /// Case-insensitive substring of the site address.
    pub location: Option<String>,
    /// Only jobs starting on or after this instant.
    pub start_date: Option<Timestamp>,
    pub page: Page,
}

impl JobSearch {
    /// Inclusive `(min, max)` rate band, when a max rate was given.
    pub fn rate_band(&self) -> Option<(f64, f64)> {
        self.max_hourly_rate
            .map(|max| ((max - RATE_BAND).max(0.0), max))
    }

    /// Trimmed, non-empty location needle.
    pub fn location_needle(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Pure predicate used by in-memory stores; Postgres expresses the same
    /// rules in SQL.
    pub fn matches(
        &self,
        trade: Trade,
        hourly_rate: f64,
        site_address: &str,
        start: Timestamp,
    ) -> bool {
        if self.trade.is_some_and(|t| t != trade) {
            return false;
        }
        if let Some((min, max)) = self.rate_band() {
            if hourly_rate < min || hourly_rate > max {
                return false;
            }
        }
        if let Some(needle) = self.location_needle() {
            if !site_address.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if self.start_date.is_some_and(|floor| start < floor) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    #[test]
    fn page_is_clamped() {
        let page = Page::new(Some(0), Some(1_000));
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, MAX_PAGE_SIZE);
        assert_eq!(Page::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn huge_page_offset_saturates() {
        assert_eq!(Page::new(Some(i64::MAX), Some(100)).offset(), i64::MAX);
        assert_eq!(Page::new(Some(i64::MAX), Some(1)).offset(), i64::MAX - 1);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::new(None, Some(20));
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(20), 1);
        assert_eq!(page.total_pages(21), 2);
    }

    #[test]
    fn rate_band_never_goes_negative() {
        let search = JobSearch {
            max_hourly_rate: Some(4.0),
            ..Default::default()
        };
        assert_eq!(search.rate_band(), Some((0.0, 4.0)));
    }

    #[test]
    fn matches_applies_every_filter() {
        let now = Utc::now();
        let search = JobSearch {
            trade: Some(Trade::Plumber),
            max_hourly_rate: Some(30.0),
            location: Some("manchester".into()),
            start_date: Some(now),
            page: Page::default(),
        };

        assert!(search.matches(Trade::Plumber, 25.0, "12 High St, Manchester", now));
        assert!(!search.matches(Trade::Carpenter, 25.0, "12 High St, Manchester", now));
        assert!(!search.matches(Trade::Plumber, 15.0, "12 High St, Manchester", now));
        assert!(!search.matches(Trade::Plumber, 25.0, "Leeds", now));
        assert!(!search.matches(
            Trade::Plumber,
            25.0,
            "Manchester",
            now - Duration::days(1)
        ));
    }
}
