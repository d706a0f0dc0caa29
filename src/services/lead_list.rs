//! Filter and page state of the lead board, and the fetch that fills it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::watch;

use crate::domain::filters::LeadFilters;
use crate::dto::leads::LeadListState;
use crate::ordering::prioritize;
use crate::pagination::ITEMS_PER_PAGE;
use crate::repository::{LeadListQuery, LeadReader};

/// How a [`LeadListController::fetch`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page and total were published.
    Applied,
    /// The request failed; the previous page was kept.
    Failed,
    /// A newer request was issued meanwhile; the response was dropped.
    Stale,
    /// The board is gone; nothing was requested or published.
    Detached,
}

/// Owns the filters and page of one mounted board and publishes
/// [`LeadListState`] snapshots through a watch channel.
pub struct LeadListController<R: ?Sized> {
    repo: Arc<R>,
    state: watch::Sender<LeadListState>,
    issued: AtomicU64,
    attached: AtomicBool,
}

impl<R: ?Sized> LeadListController<R> {
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Stops publishing. Responses still in flight are dropped.
    pub fn detach(&self) {
        self.state.send_if_modified(|_| {
            self.attached.store(false, Ordering::SeqCst);
            false
        });
    }
}

impl<R> LeadListController<R>
where
    R: LeadReader + ?Sized,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self::with_filters(repo, LeadFilters::default(), 0)
    }

    /// Controller starting from saved filters, e.g. parsed from a query string.
    pub fn with_filters(repo: Arc<R>, filters: LeadFilters, page: usize) -> Self {
        let (state, _) = watch::channel(LeadListState {
            filters,
            page,
            ..LeadListState::default()
        });
        Self {
            repo,
            state,
            issued: AtomicU64::new(0),
            attached: AtomicBool::new(true),
        }
    }

    /// Receiver notified on every published change. Dropping it unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<LeadListState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> LeadListState {
        self.state.borrow().clone()
    }

    /// Registers a request and marks the state as loading. Runs under the
    /// state lock so that issuing and applying requests are serialized.
    fn begin_request(&self) -> Option<(u64, LeadListQuery)> {
        let mut request = None;
        self.state.send_if_modified(|state| {
            if !self.is_attached() {
                return false;
            }
            let sequence = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
            let query = LeadListQuery::from_filters(&state.filters, Utc::now())
                .paginate(state.page, ITEMS_PER_PAGE);
            request = Some((sequence, query));

            let changed = !state.loading;
            state.loading = true;
            changed
        });
        request
    }

    /// Requests the current page with the current filters and publishes the
    /// prioritized result, unless a newer request was issued meanwhile.
    pub async fn fetch(&self) -> FetchOutcome {
        let Some((sequence, query)) = self.begin_request() else {
            return FetchOutcome::Detached;
        };

        let result = self.repo.list_leads(query).await;

        let mut outcome = FetchOutcome::Detached;
        self.state.send_if_modified(|state| {
            if !self.is_attached() {
                return false;
            }
            if self.issued.load(Ordering::SeqCst) != sequence {
                log::debug!("Discarding stale lead page from request {sequence}");
                outcome = FetchOutcome::Stale;
                return false;
            }

            match result {
                Ok((total, mut leads)) => {
                    prioritize(&mut leads);
                    state.leads = leads;
                    state.total = total;
                    outcome = FetchOutcome::Applied;
                }
                Err(e) => {
                    log::error!("Failed to fetch leads: {e}");
                    outcome = FetchOutcome::Failed;
                }
            }
            state.loading = false;
            true
        });
        outcome
    }

    /// Stores `change` applied to the state if still attached.
    fn update_state(&self, change: impl FnOnce(&mut LeadListState)) -> bool {
        let mut stored = false;
        self.state.send_if_modified(|state| {
            if !self.is_attached() {
                return false;
            }
            change(state);
            stored = true;
            true
        });
        stored
    }

    /// Replaces the filters and re-fetches. The page index is kept.
    pub async fn set_filters(&self, filters: LeadFilters) -> FetchOutcome {
        if !self.update_state(|state| state.filters = filters) {
            return FetchOutcome::Detached;
        }
        self.fetch().await
    }

    /// Moves to the zero-based `page` and re-fetches.
    pub async fn set_page(&self, page: usize) -> FetchOutcome {
        if !self.update_state(|state| state.page = page) {
            return FetchOutcome::Detached;
        }
        self.fetch().await
    }

    /// Updates the search text. It is kept with the filters only.
    pub async fn set_search(&self, search: Option<String>) -> FetchOutcome {
        let search = search.filter(|text| !text.trim().is_empty());
        if !self.update_state(|state| state.filters.search = search) {
            return FetchOutcome::Detached;
        }
        self.fetch().await
    }

    /// Resets filters and page to their defaults and re-fetches.
    pub async fn clear_filters(&self) -> FetchOutcome {
        let cleared = self.update_state(|state| {
            state.filters = LeadFilters::default();
            state.page = 0;
        });
        if !cleared {
            return FetchOutcome::Detached;
        }
        self.fetch().await
    }
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::domain::lead::{LeadPriority, LeadStatus};
    use crate::repository::RemoteRepository;
    use crate::repository::memory::InMemorySource;

    fn row(n: usize, priority: &str) -> serde_json::Value {
        json!({
            "id": format!("00000000-0000-4000-8000-{n:012}"),
            "protocol": format!("2025-0501-{n:05}"),
            "created_at": format!("2025-05-01T{:02}:00:00Z", n % 24),
            "status": "nova",
            "priority": priority,
            "service_type": "portao",
            "client": null
        })
    }

    fn controller(rows: Vec<serde_json::Value>) -> (InMemorySource, LeadListController<RemoteRepository<InMemorySource>>) {
        let source = InMemorySource::new();
        source.seed("orders", rows);
        let repo = RemoteRepository::new(Arc::new(source.clone()));
        (source, LeadListController::new(Arc::new(repo)))
    }

    #[tokio::test]
    async fn starts_loading_and_fetch_publishes_prioritized_page() {
        let (_, controller) = controller(vec![row(1, "baixa"), row(2, "urgente"), row(3, "media")]);
        assert!(controller.snapshot().loading);

        assert_eq!(controller.fetch().await, FetchOutcome::Applied);

        let state = controller.snapshot();
        assert!(!state.loading);
        assert_eq!(state.total, 3);
        let priorities: Vec<_> = state.leads.iter().map(|l| l.priority.clone()).collect();
        assert_eq!(
            priorities,
            vec![LeadPriority::Urgent, LeadPriority::Medium, LeadPriority::Low]
        );
    }

    #[tokio::test]
    async fn failure_keeps_previous_page_and_clears_loading() {
        let (source, controller) = controller(vec![row(1, "alta")]);
        controller.fetch().await;

        source.set_failure(Some("unavailable"));
        assert_eq!(controller.fetch().await, FetchOutcome::Failed);

        let state = controller.snapshot();
        assert!(!state.loading);
        assert_eq!(state.total, 1);
        assert_eq!(state.leads.len(), 1);
    }

    #[tokio::test]
    async fn filters_keep_page_and_clear_resets_both() {
        let (_, controller) = controller(vec![row(1, "alta")]);
        controller.set_page(1).await;

        controller
            .set_filters(LeadFilters {
                status: Some(LeadStatus::New),
                ..LeadFilters::default()
            })
            .await;
        assert_eq!(controller.snapshot().page, 1);

        controller.clear_filters().await;
        let state = controller.snapshot();
        assert_eq!(state.page, 0);
        assert_eq!(state.filters, LeadFilters::default());
        assert_eq!(state.total, 1);
    }

    #[tokio::test]
    async fn detached_controller_neither_requests_nor_publishes() {
        let (source, controller) = controller(vec![row(1, "alta")]);
        let mut updates = controller.subscribe();
        controller.detach();

        assert_eq!(controller.fetch().await, FetchOutcome::Detached);
        assert_eq!(controller.set_page(2).await, FetchOutcome::Detached);

        assert_eq!(source.select_count(), 0);
        assert!(!updates.has_changed().unwrap());
        assert_eq!(controller.snapshot().page, 0);
    }
}
