use async_trait::async_trait;
use serde_json::Value;

use crate::{
    domain::{
        lead::{Lead, NewLead, NewLeadClient, UpdateLead},
        types::{ClientId, LeadId},
    },
    models::lead::{ClientLookupArgs, LeadRow, NewLeadRow, UpdateLeadRow},
    repository::{
        ClientDirectory, LeadChangeFeed, LeadListQuery, LeadReader, LeadWriter, RemoteRepository,
        errors::{RepositoryError, RepositoryResult},
        remote::{ChangeSubscription, Predicate, RemoteDataSource, RemoteQuery, TableFilter},
    },
};

impl<S> RemoteRepository<S>
where
    S: RemoteDataSource + ?Sized,
{
    fn lead_query(&self, query: &LeadListQuery) -> RemoteQuery {
        let mut remote = RemoteQuery::new(self.table.as_str())
            .select(self.select.as_str())
            .order_by("created_at", false)
            .exact_count();

        if let Some(status) = &query.status {
            remote = remote.filter(Predicate::eq("status", status));
        }
        if let Some(priority) = &query.priority {
            remote = remote.filter(Predicate::eq("priority", priority));
        }
        if let Some(origin) = &query.origin {
            remote = remote.filter(Predicate::eq("origin", origin));
        }
        if let Some(service_type) = &query.service_type {
            remote = remote.filter(Predicate::eq("service_type", service_type));
        }
        if let Some(since) = query.created_since {
            remote = remote.filter(Predicate::gte("created_at", since.to_rfc3339()));
        }
        if let Some(pagination) = &query.pagination {
            remote = remote.window(pagination.offset(), pagination.per_page);
        }

        remote
    }
}

fn lead_from_value(value: Value) -> RepositoryResult<Lead> {
    let row: LeadRow = serde_json::from_value(value)?;
    Ok(Lead::try_from(row)?)
}

/// The get-or-create procedure answers with the bare id, or with a row
/// carrying it.
fn client_id_from_value(value: &Value) -> RepositoryResult<ClientId> {
    let raw = match value {
        Value::String(id) => Some(id.as_str()),
        Value::Object(row) => row.get("id").and_then(Value::as_str),
        Value::Array(rows) => rows
            .first()
            .and_then(|row| row.get("id"))
            .and_then(Value::as_str),
        _ => None,
    };

    match raw {
        Some(id) => Ok(id.parse::<ClientId>()?),
        None => Err(RepositoryError::NotFound),
    }
}

#[async_trait]
impl<S> LeadReader for RemoteRepository<S>
where
    S: RemoteDataSource + ?Sized,
{
    async fn list_leads(&self, query: LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)> {
        let response = self.source.select(&self.lead_query(&query)).await?;

        // A malformed row only hides itself, never the rest of the page.
        let leads = response
            .rows
            .into_iter()
            .filter_map(|row| {
                let id = row.get("id").and_then(Value::as_str).unwrap_or("?").to_string();
                lead_from_value(row)
                    .inspect_err(|e| log::warn!("Skipping lead {id} in {}: {e}", self.table))
                    .ok()
            })
            .collect::<Vec<_>>();

        Ok((response.count.unwrap_or(0), leads))
    }
}

#[async_trait]
impl<S> LeadWriter for RemoteRepository<S>
where
    S: RemoteDataSource + ?Sized,
{
    async fn update_lead(&self, lead_id: LeadId, updates: &UpdateLead) -> RepositoryResult<()> {
        let payload = serde_json::to_value(UpdateLeadRow::from(updates))?;
        self.source
            .update(&self.table, payload, &Predicate::eq("id", lead_id))
            .await
    }

    async fn create_lead(&self, new_lead: &NewLead) -> RepositoryResult<()> {
        let payload = serde_json::to_value(NewLeadRow::from(new_lead))?;
        self.source.insert(&self.table, payload).await
    }
}

#[async_trait]
impl<S> ClientDirectory for RemoteRepository<S>
where
    S: RemoteDataSource + ?Sized,
{
    async fn get_or_create_client(&self, client: &NewLeadClient) -> RepositoryResult<ClientId> {
        let args = serde_json::to_value(ClientLookupArgs::from(client))?;
        let result = self.source.rpc(&self.client_procedure, args).await?;
        client_id_from_value(&result)
    }
}

#[async_trait]
impl<S> LeadChangeFeed for RemoteRepository<S>
where
    S: RemoteDataSource + ?Sized,
{
    async fn subscribe_lead_changes(&self) -> RepositoryResult<ChangeSubscription> {
        let filter = TableFilter::all_changes(self.schema.as_str(), self.table.as_str());
        self.source.subscribe(&self.channel(), &filter).await
    }
}
