//! Filter state of the lead board.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::lead::{LeadOrigin, LeadPriority, LeadStatus};
use crate::domain::types::ServiceType;

/// Relative creation-time window selectable on the board.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DateRange {
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
}

impl DateRange {
    pub fn duration(self) -> Duration {
        match self {
            DateRange::Last24Hours => Duration::hours(24),
            DateRange::Last7Days => Duration::days(7),
            DateRange::Last30Days => Duration::days(30),
        }
    }

    /// Absolute lower bound for `created_at` relative to `now`.
    pub fn lower_bound(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }

    pub fn token(self) -> &'static str {
        match self {
            DateRange::Last24Hours => "24h",
            DateRange::Last7Days => "7d",
            DateRange::Last30Days => "30d",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "24h" => Some(DateRange::Last24Hours),
            "7d" => Some(DateRange::Last7Days),
            "30d" => Some(DateRange::Last30Days),
            _ => None,
        }
    }
}

/// Optional predicates narrowing the lead list. `None` means "any".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LeadFilters {
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
    pub origin: Option<LeadOrigin>,
    pub service_type: Option<ServiceType>,
    pub date_range: Option<DateRange>,
    /// Kept for the search box; not sent to the remote source.
    pub search: Option<String>,
}

impl LeadFilters {
    /// Whether any filter is set, search included.
    pub fn is_active(&self) -> bool {
        self.status.is_some()
            || self.priority.is_some()
            || self.origin.is_some()
            || self.service_type.is_some()
            || self.date_range.is_some()
            || self.search.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_bound_subtracts_exact_duration() {
        let now = Utc::now();
        assert_eq!(
            now - DateRange::Last24Hours.lower_bound(now),
            Duration::hours(24)
        );
        assert_eq!(now - DateRange::Last7Days.lower_bound(now), Duration::days(7));
        assert_eq!(
            now - DateRange::Last30Days.lower_bound(now),
            Duration::days(30)
        );
    }

    #[test]
    fn tokens_round_trip() {
        for range in [
            DateRange::Last24Hours,
            DateRange::Last7Days,
            DateRange::Last30Days,
        ] {
            assert_eq!(DateRange::from_token(range.token()), Some(range));
        }
        assert_eq!(DateRange::from_token("1y"), None);
    }

    #[test]
    fn search_alone_marks_filters_active() {
        let filters = LeadFilters {
            search: Some("Maria".to_string()),
            ..LeadFilters::default()
        };
        assert!(filters.is_active());
        assert!(!LeadFilters::default().is_active());
    }
}
