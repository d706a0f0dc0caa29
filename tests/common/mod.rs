#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tokio::sync::oneshot;
use uuid::Uuid;

use fieldcrm_leads::domain::lead::{Lead, LeadPriority, LeadStatus};
use fieldcrm_leads::domain::types::{LeadId, ProtocolCode, ServiceType};
use fieldcrm_leads::repository::errors::{RepositoryError, RepositoryResult};
use fieldcrm_leads::repository::memory::InMemorySource;
use fieldcrm_leads::repository::{LeadListQuery, LeadReader, RemoteRepository};

pub const LEADS_TABLE: &str = "orders";

pub fn lead_uuid(serial: u32) -> String {
    Uuid::from_u128(serial as u128).to_string()
}

pub fn protocol(serial: u32) -> String {
    format!("2025-0501-{serial:05}")
}

/// Serial number encoded in a fixture protocol code.
pub fn serial_of(lead: &Lead) -> u32 {
    lead.protocol
        .as_str()
        .rsplit('-')
        .next()
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

/// Wire row as the backend returns it, with the client join.
pub fn lead_row(serial: u32, status: &str, priority: &str, created_at: DateTime<Utc>) -> Value {
    json!({
        "id": lead_uuid(serial),
        "protocol": protocol(serial),
        "created_at": created_at.to_rfc3339(),
        "status": status,
        "priority": priority,
        "service_type": "portao",
        "description": format!("Pedido {serial}"),
        "origin": "landing_form",
        "client": {
            "id": Uuid::from_u128(1_000 + serial as u128).to_string(),
            "name": format!("Cliente {serial}"),
            "phone": "11987654321",
            "address": "Rua das Flores, 10"
        }
    })
}

pub fn lead(serial: u32, priority: &str, created_at: DateTime<Utc>) -> Lead {
    Lead {
        id: LeadId::new(Uuid::from_u128(serial as u128)),
        protocol: ProtocolCode::new(protocol(serial)).unwrap(),
        created_at,
        status: LeadStatus::New,
        priority: LeadPriority::from(priority),
        service_type: ServiceType::new("portao").unwrap(),
        description: None,
        origin: None,
        client: None,
    }
}

/// `count` leads, serial 1 newest, one minute apart.
pub fn seeded_source(count: u32, priority: &str) -> InMemorySource {
    let now = Utc::now();
    let rows = (1..=count)
        .map(|serial| {
            lead_row(
                serial,
                "nova",
                priority,
                now - chrono::Duration::minutes(serial as i64),
            )
        })
        .collect();
    let source = InMemorySource::new();
    source.seed(LEADS_TABLE, rows);
    source
}

pub fn repository(source: &InMemorySource) -> Arc<RemoteRepository<InMemorySource>> {
    Arc::new(RemoteRepository::new(Arc::new(source.clone())))
}

type Reply = RepositoryResult<(usize, Vec<Lead>)>;

/// Reader whose responses are released by the test, in any order.
#[derive(Default)]
pub struct ScriptedReader {
    queries: Mutex<Vec<LeadListQuery>>,
    replies: Mutex<Vec<Option<oneshot::Sender<Reply>>>>,
}

impl ScriptedReader {
    pub fn queries(&self) -> Vec<LeadListQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub async fn wait_for_calls(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.queries.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("reader was not called in time");
    }

    /// Completes the `index`-th request.
    pub fn respond(&self, index: usize, reply: Reply) {
        let sender = self.replies.lock().unwrap()[index]
            .take()
            .expect("request already answered");
        let _ = sender.send(reply);
    }
}

#[async_trait]
impl LeadReader for ScriptedReader {
    async fn list_leads(&self, query: LeadListQuery) -> RepositoryResult<(usize, Vec<Lead>)> {
        let (sender, receiver) = oneshot::channel();
        {
            let mut replies = self.replies.lock().unwrap();
            let mut queries = self.queries.lock().unwrap();
            replies.push(Some(sender));
            queries.push(query);
        }
        receiver
            .await
            .unwrap_or_else(|_| Err(RepositoryError::Unexpected("reply dropped".to_string())))
    }
}

/// Waits until `check` holds for the published state.
pub async fn wait_until<T, F>(receiver: &mut tokio::sync::watch::Receiver<T>, check: F)
where
    F: Fn(&T) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        while !check(&receiver.borrow_and_update()) {
            receiver.changed().await.expect("state sender dropped");
        }
    })
    .await
    .expect("state did not settle in time");
}
