//! Contract of the hosted backend: filtered queries, writes, procedures and
//! row-level change subscriptions.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::repository::errors::RepositoryResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Eq { column: String, value: String },
    Gte { column: String, value: String },
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Predicate::Eq {
            column: column.into(),
            value: value.to_string(),
        }
    }

    pub fn gte(column: impl Into<String>, value: impl ToString) -> Self {
        Predicate::Gte {
            column: column.into(),
            value: value.to_string(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Predicate::Eq { column, .. } | Predicate::Gte { column, .. } => column,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Predicate::Eq { value, .. } | Predicate::Gte { value, .. } => value,
        }
    }

    /// Filter operator as spelled in query strings.
    pub fn operator(&self) -> &'static str {
        match self {
            Predicate::Eq { .. } => "eq",
            Predicate::Gte { .. } => "gte",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

/// One filtered, ordered, windowed read against a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteQuery {
    pub table: String,
    pub select: String,
    pub predicates: Vec<Predicate>,
    pub order: Option<OrderBy>,
    pub offset: usize,
    pub limit: Option<usize>,
    /// Ask for the exact number of rows matching `predicates`.
    pub count_exact: bool,
}

impl RemoteQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: "*".to_string(),
            predicates: Vec::new(),
            order: None,
            offset: 0,
            limit: None,
            count_exact: false,
        }
    }

    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = columns.into();
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(OrderBy {
            column: column.into(),
            ascending,
        });
        self
    }

    pub fn window(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    pub fn exact_count(mut self) -> Self {
        self.count_exact = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub rows: Vec<Value>,
    /// Present when the query asked for an exact count.
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_wire(self) -> &'static str {
        match self {
            ChangeKind::Insert => "INSERT",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "INSERT" => Some(ChangeKind::Insert),
            "UPDATE" => Some(ChangeKind::Update),
            "DELETE" => Some(ChangeKind::Delete),
            _ => None,
        }
    }
}

/// Which change events a subscription receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFilter {
    pub schema: String,
    pub table: String,
    /// `None` subscribes to every kind of change.
    pub event: Option<ChangeKind>,
}

impl TableFilter {
    pub fn all_changes(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            event: None,
        }
    }

    pub fn event_wire(&self) -> &'static str {
        self.event.map(ChangeKind::as_wire).unwrap_or("*")
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.schema == event.schema
            && self.table == event.table
            && self.event.is_none_or(|kind| kind == event.kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub schema: String,
    pub table: String,
    pub record: Value,
    pub old_record: Value,
}

/// Releases a live subscription. Closing happens at most once: either via
/// [`SubscriptionHandle::close`] or when the handle is dropped.
pub struct SubscriptionHandle {
    closer: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionHandle {
    pub fn new(closer: impl FnOnce() + Send + 'static) -> Self {
        Self {
            closer: Some(Box::new(closer)),
        }
    }

    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(closer) = self.closer.take() {
            closer();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("open", &self.closer.is_some())
            .finish()
    }
}

/// Stream of change events plus the handle that ends it.
#[derive(Debug)]
pub struct ChangeSubscription {
    events: mpsc::Receiver<ChangeEvent>,
    handle: SubscriptionHandle,
}

impl ChangeSubscription {
    pub fn new(events: mpsc::Receiver<ChangeEvent>, handle: SubscriptionHandle) -> Self {
        Self { events, handle }
    }

    pub fn into_parts(self) -> (mpsc::Receiver<ChangeEvent>, SubscriptionHandle) {
        (self.events, self.handle)
    }
}

#[async_trait]
pub trait RemoteDataSource: Send + Sync {
    async fn select(&self, query: &RemoteQuery) -> RepositoryResult<QueryResponse>;
    async fn update(&self, table: &str, payload: Value, matching: &Predicate)
    -> RepositoryResult<()>;
    async fn insert(&self, table: &str, rows: Value) -> RepositoryResult<()>;
    async fn rpc(&self, function: &str, args: Value) -> RepositoryResult<Value>;
    async fn subscribe(
        &self,
        channel: &str,
        filter: &TableFilter,
    ) -> RepositoryResult<ChangeSubscription>;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn handle_closes_exactly_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&closes);
        let handle = SubscriptionHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        handle.close();

        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_the_handle_closes_it() {
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&closes);
        {
            let _handle = SubscriptionHandle::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn table_filter_matches_schema_table_and_kind() {
        let event = ChangeEvent {
            kind: ChangeKind::Update,
            schema: "public".to_string(),
            table: "orders".to_string(),
            record: Value::Null,
            old_record: Value::Null,
        };

        assert!(TableFilter::all_changes("public", "orders").matches(&event));
        assert!(!TableFilter::all_changes("public", "clients").matches(&event));
        let inserts_only = TableFilter {
            event: Some(ChangeKind::Insert),
            ..TableFilter::all_changes("public", "orders")
        };
        assert!(!inserts_only.matches(&event));
        assert_eq!(inserts_only.event_wire(), "INSERT");
    }
}
