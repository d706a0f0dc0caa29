//! State snapshots published to the lead board views.

use crate::domain::filters::LeadFilters;
use crate::domain::lead::Lead;
use crate::pagination::{page_links, total_pages};

/// Everything the board needs to render one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadListState {
    /// Current page, already ordered by priority.
    pub leads: Vec<Lead>,
    pub loading: bool,
    pub filters: LeadFilters,
    /// Zero-based page index.
    pub page: usize,
    /// Records matching `filters`, independent of pagination.
    pub total: usize,
}

impl Default for LeadListState {
    fn default() -> Self {
        Self {
            leads: Vec::new(),
            loading: true,
            filters: LeadFilters::default(),
            page: 0,
            total: 0,
        }
    }
}

impl LeadListState {
    pub fn total_pages(&self) -> usize {
        total_pages(self.total)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages()
    }

    /// Pager links around the current page.
    pub fn page_links(&self) -> Vec<Option<usize>> {
        page_links(self.total_pages(), self.page, 1, 2)
    }
}

/// Loading and error flags of the lead detail panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadDetailState {
    pub loading: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pager_flags_follow_total() {
        let state = LeadListState {
            total: 23,
            page: 2,
            loading: false,
            ..LeadListState::default()
        };

        assert_eq!(state.total_pages(), 3);
        assert!(state.has_previous());
        assert!(!state.has_next());
        assert_eq!(state.page_links(), vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn fresh_state_is_loading_and_empty() {
        let state = LeadListState::default();
        assert!(state.loading);
        assert_eq!(state.total_pages(), 0);
        assert!(!state.has_next());
        assert!(state.page_links().is_empty());
    }
}
