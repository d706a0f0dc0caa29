//! Mount and unmount lifecycle of one lead board view.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::filters::LeadFilters;
use crate::dto::leads::LeadListState;
use crate::repository::{LeadChangeFeed, LeadReader};
use crate::services::lead_list::{FetchOutcome, LeadListController};
use crate::services::live_refresh::LiveRefresh;

/// A mounted board: list controller plus live refresh. Dropping the board
/// unmounts it.
pub struct LeadBoard<R: ?Sized> {
    controller: Arc<LeadListController<R>>,
    refresh: Option<LiveRefresh>,
}

impl<R> LeadBoard<R>
where
    R: LeadReader + LeadChangeFeed + ?Sized + 'static,
{
    pub async fn mount(repo: Arc<R>) -> Self {
        Self::mount_with(repo, LeadFilters::default(), 0).await
    }

    /// Subscribes to changes, then performs the initial fetch. A failed
    /// subscription is logged and the board works without live updates.
    pub async fn mount_with(repo: Arc<R>, filters: LeadFilters, page: usize) -> Self {
        let controller = Arc::new(LeadListController::with_filters(
            Arc::clone(&repo),
            filters,
            page,
        ));

        let refresh = match LiveRefresh::mount(repo.as_ref(), Arc::clone(&controller)).await {
            Ok(refresh) => Some(refresh),
            Err(e) => {
                log::error!("Failed to subscribe to lead changes: {e}");
                None
            }
        };

        controller.fetch().await;

        Self {
            controller,
            refresh,
        }
    }

    pub fn controller(&self) -> &Arc<LeadListController<R>> {
        &self.controller
    }

    pub fn subscribe(&self) -> watch::Receiver<LeadListState> {
        self.controller.subscribe()
    }

    pub fn snapshot(&self) -> LeadListState {
        self.controller.snapshot()
    }

    pub fn is_live(&self) -> bool {
        self.refresh.as_ref().is_some_and(LiveRefresh::is_live)
    }

    pub async fn set_filters(&self, filters: LeadFilters) -> FetchOutcome {
        self.controller.set_filters(filters).await
    }

    pub async fn set_page(&self, page: usize) -> FetchOutcome {
        self.controller.set_page(page).await
    }

    pub async fn set_search(&self, search: Option<String>) -> FetchOutcome {
        self.controller.set_search(search).await
    }

    pub async fn clear_filters(&self) -> FetchOutcome {
        self.controller.clear_filters().await
    }

    pub async fn refresh(&self) -> FetchOutcome {
        self.controller.fetch().await
    }

    pub fn unmount(mut self) {
        self.shutdown();
    }
}

impl<R: ?Sized> LeadBoard<R> {
    fn shutdown(&mut self) {
        self.controller.detach();
        if let Some(refresh) = self.refresh.take() {
            refresh.unmount();
        }
    }
}

impl<R: ?Sized> Drop for LeadBoard<R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
