//! In-process [`RemoteDataSource`] holding JSON rows per table.
//!
//! Stands in for the hosted backend in tests. Writes are broadcast to
//! subscribers the same way the hosted change feed would report them.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::remote::{
    ChangeEvent, ChangeKind, ChangeSubscription, OrderBy, Predicate, QueryResponse,
    RemoteDataSource, RemoteQuery, SubscriptionHandle, TableFilter,
};

const SUBSCRIBER_BUFFER: usize = 64;

type Procedure = Box<dyn Fn(&Value) -> RepositoryResult<Value> + Send + Sync>;
type ColumnDefault = Box<dyn Fn() -> Value + Send + Sync>;

struct Subscriber {
    id: u64,
    filter: TableFilter,
    sender: mpsc::Sender<ChangeEvent>,
}

#[derive(Default)]
struct Store {
    schema: String,
    tables: HashMap<String, Vec<Value>>,
    defaults: HashMap<String, Vec<(String, ColumnDefault)>>,
    procedures: HashMap<String, Procedure>,
    subscribers: Vec<Subscriber>,
    next_subscriber: u64,
    failure: Option<String>,
}

impl Store {
    fn check_failure(&self) -> RepositoryResult<()> {
        match &self.failure {
            Some(message) => Err(RepositoryError::Remote {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn notify(&mut self, event: ChangeEvent) {
        self.subscribers.retain(|subscriber| {
            if !subscriber.filter.matches(&event) {
                return true;
            }
            match subscriber.sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    log::warn!("Dropping change event for a slow subscriber");
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            }
        });
    }

    fn change(&self, kind: ChangeKind, table: &str, record: Value, old_record: Value) -> ChangeEvent {
        ChangeEvent {
            kind,
            schema: self.schema.clone(),
            table: table.to_string(),
            record,
            old_record,
        }
    }
}

/// Shared in-memory tables. Cloning yields another handle on the same data.
#[derive(Clone)]
pub struct InMemorySource {
    store: Arc<Mutex<Store>>,
    selects: Arc<AtomicUsize>,
    closed_subscriptions: Arc<AtomicUsize>,
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySource {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(Store {
                schema: "public".to_string(),
                ..Store::default()
            })),
            selects: Arc::new(AtomicUsize::new(0)),
            closed_subscriptions: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the rows of `table` without notifying subscribers.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.store().tables.insert(table.to_string(), rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.store().tables.get(table).cloned().unwrap_or_default()
    }

    /// Fills `column` on inserted rows that do not carry it, the way a
    /// database default or trigger would.
    pub fn set_default(
        &self,
        table: &str,
        column: &str,
        generator: impl Fn() -> Value + Send + Sync + 'static,
    ) {
        self.store()
            .defaults
            .entry(table.to_string())
            .or_default()
            .push((column.to_string(), Box::new(generator)));
    }

    pub fn register_procedure(
        &self,
        name: &str,
        procedure: impl Fn(&Value) -> RepositoryResult<Value> + Send + Sync + 'static,
    ) {
        self.store()
            .procedures
            .insert(name.to_string(), Box::new(procedure));
    }

    /// Makes every following call fail with `message` until cleared with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        self.store().failure = message.map(str::to_string);
    }

    /// Removes the rows matching `matching` and reports a delete per row.
    pub fn delete(&self, table: &str, matching: &Predicate) -> RepositoryResult<usize> {
        let mut store = self.store();
        store.check_failure()?;
        let rows = store.tables.entry(table.to_string()).or_default();
        let (removed, kept): (Vec<Value>, Vec<Value>) = rows
            .drain(..)
            .partition(|row| predicate_matches(row, matching));
        *rows = kept;

        let count = removed.len();
        for old in removed {
            let event = store.change(ChangeKind::Delete, table, Value::Null, old);
            store.notify(event);
        }
        Ok(count)
    }

    pub fn subscriber_count(&self) -> usize {
        self.store().subscribers.len()
    }

    /// Number of subscription handles closed so far.
    pub fn closed_subscriptions(&self) -> usize {
        self.closed_subscriptions.load(Ordering::SeqCst)
    }

    /// Number of `select` calls served so far.
    pub fn select_count(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }
}

fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn compare_values(left: &str, right: &str) -> CmpOrdering {
    if let (Some(l), Some(r)) = (parse_timestamp(left), parse_timestamp(right)) {
        return l.cmp(&r);
    }
    if let (Ok(l), Ok(r)) = (left.parse::<f64>(), right.parse::<f64>()) {
        return l.partial_cmp(&r).unwrap_or(CmpOrdering::Equal);
    }
    left.cmp(right)
}

fn predicate_matches(row: &Value, predicate: &Predicate) -> bool {
    let Some(actual) = column_text(row, predicate.column()) else {
        return false;
    };
    match predicate {
        Predicate::Eq { value, .. } => actual == *value,
        Predicate::Gte { value, .. } => compare_values(&actual, value) != CmpOrdering::Less,
    }
}

fn order_rows(rows: &mut [Value], order: &OrderBy) {
    rows.sort_by(|a, b| {
        let ordering = match (column_text(a, &order.column), column_text(b, &order.column)) {
            (Some(l), Some(r)) => compare_values(&l, &r),
            (Some(_), None) => CmpOrdering::Greater,
            (None, Some(_)) => CmpOrdering::Less,
            (None, None) => CmpOrdering::Equal,
        };
        if order.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

fn merge(row: &mut Value, payload: &Map<String, Value>) {
    if let Value::Object(fields) = row {
        for (key, value) in payload {
            fields.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl RemoteDataSource for InMemorySource {
    async fn select(&self, query: &RemoteQuery) -> RepositoryResult<QueryResponse> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        let store = self.store();
        store.check_failure()?;

        let mut rows: Vec<Value> = store
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.predicates.iter().all(|p| predicate_matches(row, p)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            order_rows(&mut rows, order);
        }

        let count = query.count_exact.then_some(rows.len());
        let window = rows.into_iter().skip(query.offset);
        let rows = match query.limit {
            Some(limit) => window.take(limit).collect(),
            None => window.collect(),
        };

        Ok(QueryResponse { rows, count })
    }

    async fn update(
        &self,
        table: &str,
        payload: Value,
        matching: &Predicate,
    ) -> RepositoryResult<()> {
        let Value::Object(fields) = payload else {
            return Err(RepositoryError::ValidationError(
                "update payload must be an object".to_string(),
            ));
        };

        let mut store = self.store();
        store.check_failure()?;

        let mut changes = Vec::new();
        if let Some(rows) = store.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| predicate_matches(row, matching)) {
                let old = row.clone();
                merge(row, &fields);
                changes.push((row.clone(), old));
            }
        }

        for (record, old) in changes {
            let event = store.change(ChangeKind::Update, table, record, old);
            store.notify(event);
        }
        Ok(())
    }

    async fn insert(&self, table: &str, rows: Value) -> RepositoryResult<()> {
        let rows = match rows {
            Value::Array(rows) => rows,
            row @ Value::Object(_) => vec![row],
            _ => {
                return Err(RepositoryError::ValidationError(
                    "insert payload must be an object or an array".to_string(),
                ));
            }
        };

        let mut store = self.store();
        store.check_failure()?;

        let mut inserted = Vec::with_capacity(rows.len());
        for mut row in rows {
            if let Value::Object(fields) = &mut row {
                fields
                    .entry("id")
                    .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
                fields
                    .entry("created_at")
                    .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
                if let Some(defaults) = store.defaults.get(table) {
                    for (column, generator) in defaults {
                        if fields.get(column).is_none_or(Value::is_null) {
                            fields.insert(column.clone(), generator());
                        }
                    }
                }
            }
            inserted.push(row);
        }

        store
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(inserted.iter().cloned());

        for row in inserted {
            let event = store.change(ChangeKind::Insert, table, row, Value::Null);
            store.notify(event);
        }
        Ok(())
    }

    async fn rpc(&self, function: &str, args: Value) -> RepositoryResult<Value> {
        let store = self.store();
        store.check_failure()?;
        match store.procedures.get(function) {
            Some(procedure) => procedure(&args),
            None => Err(RepositoryError::Remote {
                status: 404,
                message: format!("Could not find the function {function}"),
            }),
        }
    }

    async fn subscribe(
        &self,
        channel: &str,
        filter: &TableFilter,
    ) -> RepositoryResult<ChangeSubscription> {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);

        let id = {
            let mut store = self.store();
            store.check_failure()?;
            let id = store.next_subscriber;
            store.next_subscriber += 1;
            store.subscribers.push(Subscriber {
                id,
                filter: filter.clone(),
                sender,
            });
            id
        };
        log::debug!("Subscribed to {channel} as #{id}");

        let store = Arc::clone(&self.store);
        let closed = Arc::clone(&self.closed_subscriptions);
        let handle = SubscriptionHandle::new(move || {
            store
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .subscribers
                .retain(|subscriber| subscriber.id != id);
            closed.fetch_add(1, Ordering::SeqCst);
        });

        Ok(ChangeSubscription::new(receiver, handle))
    }
}
