//! Re-fetches the lead list whenever the remote change feed reports a write.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;

use crate::repository::remote::SubscriptionHandle;
use crate::repository::{LeadChangeFeed, LeadReader};
use crate::services::errors::ServiceResult;
use crate::services::lead_list::{FetchOutcome, LeadListController};

/// Live subscription of one mounted board. Unmounting (or dropping) closes
/// the subscription exactly once.
pub struct LiveRefresh {
    handle: Option<SubscriptionHandle>,
    task: JoinHandle<()>,
    live: Arc<AtomicBool>,
}

impl LiveRefresh {
    /// Subscribes to lead changes and spawns the task that re-fetches on
    /// each event. Must be called inside a tokio runtime.
    pub async fn mount<F, R>(feed: &F, controller: Arc<LeadListController<R>>) -> ServiceResult<Self>
    where
        F: LeadChangeFeed + ?Sized,
        R: LeadReader + ?Sized + 'static,
    {
        let (mut events, handle) = feed.subscribe_lead_changes().await?.into_parts();
        let live = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&live);

        let task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                // One fetch covers every change queued so far.
                let mut queued = 0usize;
                while events.try_recv().is_ok() {
                    queued += 1;
                }
                log::debug!(
                    "{:?} on {}.{} (+{queued} queued), refreshing leads",
                    event.kind,
                    event.schema,
                    event.table
                );
                if controller.fetch().await == FetchOutcome::Detached {
                    break;
                }
            }
            if flag.swap(false, Ordering::SeqCst) {
                log::warn!("Lead change feed ended; the list is no longer live");
            }
        });

        Ok(Self {
            handle: Some(handle),
            task,
            live,
        })
    }

    /// `false` once unmounted or after the change feed ended.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub fn unmount(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.live.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.close();
            self.task.abort();
        }
    }
}

impl Drop for LiveRefresh {
    fn drop(&mut self) {
        self.shutdown();
    }
}
