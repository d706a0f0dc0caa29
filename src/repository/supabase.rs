use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::config::LeadsConfig;
use crate::repository::errors::RepositoryResult;
use crate::repository::realtime::RealtimeClient;
use crate::repository::remote::{
    ChangeSubscription, Predicate, QueryResponse, RemoteDataSource, RemoteQuery, TableFilter,
};
use crate::repository::rest::PostgrestClient;

/// Hosted backend: reads and writes over HTTP, changes over the realtime socket.
#[derive(Clone)]
pub struct SupabaseSource {
    rest: PostgrestClient,
    realtime: RealtimeClient,
}

impl SupabaseSource {
    pub fn new(config: &LeadsConfig) -> RepositoryResult<Self> {
        Ok(Self {
            rest: PostgrestClient::new(
                &config.backend_url,
                &config.api_key,
                Duration::from_secs(config.request_timeout_secs),
            )?,
            realtime: RealtimeClient::new(
                &config.backend_url,
                &config.api_key,
                Duration::from_secs(config.heartbeat_interval_secs),
            )?,
        })
    }
}

#[async_trait]
impl RemoteDataSource for SupabaseSource {
    async fn select(&self, query: &RemoteQuery) -> RepositoryResult<QueryResponse> {
        self.rest.select(query).await
    }

    async fn update(
        &self,
        table: &str,
        payload: Value,
        matching: &Predicate,
    ) -> RepositoryResult<()> {
        self.rest.update(table, payload, matching).await
    }

    async fn insert(&self, table: &str, rows: Value) -> RepositoryResult<()> {
        self.rest.insert(table, rows).await
    }

    async fn rpc(&self, function: &str, args: Value) -> RepositoryResult<Value> {
        self.rest.rpc(function, args).await
    }

    async fn subscribe(
        &self,
        channel: &str,
        filter: &TableFilter,
    ) -> RepositoryResult<ChangeSubscription> {
        self.realtime.subscribe(channel, filter).await
    }
}
