//! Page-local ordering of fetched leads.
//!
//! The remote source only orders by creation time, so each page is re-sorted
//! by priority rank here. Records never move across page boundaries.

use std::cmp::Reverse;

use crate::domain::lead::Lead;

/// Stable sort: priority rank descending, then newest first.
pub fn prioritize(leads: &mut [Lead]) {
    leads.sort_by_key(|lead| (Reverse(lead.priority.rank()), Reverse(lead.created_at)));
}

/// Whether `leads` already satisfies the order produced by [`prioritize`].
pub fn is_prioritized(leads: &[Lead]) -> bool {
    leads.windows(2).all(|pair| {
        let (a, b) = (&pair[0], &pair[1]);
        a.priority.rank() > b.priority.rank()
            || (a.priority.rank() == b.priority.rank() && a.created_at >= b.created_at)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use crate::domain::lead::{LeadPriority, LeadStatus};
    use crate::domain::types::{LeadId, ProtocolCode, ServiceType};

    fn lead(serial: u32, priority: &str, minutes_ago: i64) -> Lead {
        let base = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        Lead {
            id: LeadId::new(Uuid::new_v4()),
            protocol: ProtocolCode::new(format!("2025-0501-{serial:05}")).unwrap(),
            created_at: base - Duration::minutes(minutes_ago),
            status: LeadStatus::New,
            priority: LeadPriority::from(priority),
            service_type: ServiceType::new("portao").unwrap(),
            description: None,
            origin: None,
            client: None,
        }
    }

    fn protocols(leads: &[Lead]) -> Vec<&str> {
        leads.iter().map(|l| l.protocol.as_str()).collect()
    }

    #[test]
    fn equal_timestamps_keep_relative_order() {
        let mut page = vec![
            lead(1, "baixa", 0),
            lead(2, "urgente", 0),
            lead(3, "media", 0),
            lead(4, "urgente", 0),
        ];

        prioritize(&mut page);

        let priorities: Vec<_> = page.iter().map(|l| l.priority.clone()).collect();
        assert_eq!(
            priorities,
            vec![
                LeadPriority::Urgent,
                LeadPriority::Urgent,
                LeadPriority::Medium,
                LeadPriority::Low
            ]
        );
        assert_eq!(
            protocols(&page),
            vec!["2025-0501-00002", "2025-0501-00004", "2025-0501-00003", "2025-0501-00001"]
        );
    }

    #[test]
    fn ties_are_broken_by_newest_first() {
        let mut page = vec![
            lead(1, "alta", 30),
            lead(2, "alta", 5),
            lead(3, "desconhecida", 1),
            lead(4, "baixa", 0),
        ];

        prioritize(&mut page);

        assert_eq!(
            protocols(&page),
            vec!["2025-0501-00002", "2025-0501-00001", "2025-0501-00004", "2025-0501-00003"]
        );
        assert!(is_prioritized(&page));
    }

    #[test]
    fn empty_and_single_pages_are_untouched() {
        let mut empty: Vec<Lead> = Vec::new();
        prioritize(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![lead(9, "media", 3)];
        prioritize(&mut single);
        assert_eq!(protocols(&single), vec!["2025-0501-00009"]);
    }
}
