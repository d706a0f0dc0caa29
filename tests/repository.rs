#![cfg(feature = "test-mocks")]

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use fieldcrm_leads::domain::lead::{LeadPriority, LeadStatus, UpdateLead};
use fieldcrm_leads::domain::types::{LeadDescription, LeadId, TeamId};
use fieldcrm_leads::models::config::LeadsConfig;
use fieldcrm_leads::repository::memory::InMemorySource;
use fieldcrm_leads::repository::remote::{ChangeKind, RemoteDataSource};
use fieldcrm_leads::repository::{
    LeadChangeFeed, LeadListQuery, LeadReader, LeadWriter, RemoteRepository,
};

mod common;

#[tokio::test]
async fn list_leads_applies_equality_filters_and_window() {
    let now = Utc::now();
    let source = InMemorySource::new();
    source.seed(
        common::LEADS_TABLE,
        vec![
            common::lead_row(1, "nova", "alta", now - Duration::minutes(1)),
            common::lead_row(2, "agendada", "alta", now - Duration::minutes(2)),
            common::lead_row(3, "nova", "baixa", now - Duration::minutes(3)),
            common::lead_row(4, "nova", "alta", now - Duration::minutes(4)),
        ],
    );
    let repo = common::repository(&source);

    let (total, leads) = repo
        .list_leads(
            LeadListQuery::new()
                .status(LeadStatus::New)
                .priority(LeadPriority::High)
                .paginate(0, 1),
        )
        .await
        .unwrap();

    assert_eq!(total, 2);
    assert_eq!(leads.len(), 1);
    assert_eq!(common::serial_of(&leads[0]), 1);
    let client = leads[0].client.as_ref().unwrap();
    assert_eq!(client.name.as_str(), "Cliente 1");
    assert_eq!(
        client.whatsapp_link().as_deref(),
        Some("https://wa.me/5511987654321")
    );
}

#[tokio::test]
async fn malformed_rows_are_skipped_without_failing_the_page() {
    let now = Utc::now();
    let source = InMemorySource::new();
    let mut missing_protocol = common::lead_row(1, "nova", "alta", now);
    missing_protocol["protocol"] = serde_json::Value::Null;
    let mut legacy_protocol = common::lead_row(2, "nova", "alta", now - Duration::minutes(1));
    legacy_protocol["protocol"] = json!("OS-2025-0010");
    source.seed(
        common::LEADS_TABLE,
        vec![
            missing_protocol,
            legacy_protocol,
            common::lead_row(3, "nova", "alta", now - Duration::minutes(2)),
        ],
    );
    let repo = common::repository(&source);

    let (total, leads) = repo
        .list_leads(LeadListQuery::new().paginate(0, 10))
        .await
        .unwrap();

    assert_eq!(total, 3);
    let ids: Vec<_> = leads.iter().map(|lead| lead.id.to_string()).collect();
    assert_eq!(ids, vec![common::lead_uuid(2), common::lead_uuid(3)]);
    assert_eq!(leads[0].protocol.as_str(), "OS-2025-0010");
}

#[tokio::test]
async fn update_lead_sends_only_set_fields() {
    let source = common::seeded_source(2, "media");
    let repo = common::repository(&source);
    let team = TeamId::new(Uuid::from_u128(99));
    let updates = UpdateLead {
        status: Some(LeadStatus::Scheduled),
        description: Some(LeadDescription::new("Visita <b>amanhã</b><script>x</script>").unwrap()),
        assigned_team_id: Some(team),
        ..UpdateLead::default()
    };

    repo.update_lead(LeadId::new(Uuid::from_u128(2)), &updates)
        .await
        .unwrap();

    let rows = source.rows(common::LEADS_TABLE);
    let updated = rows
        .iter()
        .find(|row| row["id"] == common::lead_uuid(2))
        .unwrap();
    assert_eq!(updated["status"], "agendada");
    assert_eq!(updated["priority"], "media");
    assert_eq!(updated["assigned_team_id"], team.to_string());
    assert_eq!(updated["description"], "Visita <b>amanhã</b>");

    let untouched = rows
        .iter()
        .find(|row| row["id"] == common::lead_uuid(1))
        .unwrap();
    assert_eq!(untouched["status"], "nova");
}

#[tokio::test]
async fn remote_failures_surface_as_repository_errors() {
    let source = common::seeded_source(1, "alta");
    source.set_failure(Some("permission denied for table orders"));
    let repo = common::repository(&source);

    let err = repo
        .update_lead(
            LeadId::new(Uuid::from_u128(1)),
            &UpdateLead {
                priority: Some(LeadPriority::Low),
                ..UpdateLead::default()
            },
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("permission denied for table orders"));
}

#[tokio::test]
async fn change_feed_uses_configured_table() {
    let config: LeadsConfig = serde_json::from_value(json!({
        "backend_url": "http://localhost:54321",
        "api_key": "anon",
        "leads_table": "service_orders"
    }))
    .unwrap();
    let source = InMemorySource::new();
    let repo = RemoteRepository::from_config(Arc::new(source.clone()), &config);
    assert_eq!(repo.channel(), "public:service_orders");

    let (mut events, handle) = repo.subscribe_lead_changes().await.unwrap().into_parts();

    source
        .insert("orders", json!({"status": "nova"}))
        .await
        .unwrap();
    source
        .insert("service_orders", json!({"status": "nova"}))
        .await
        .unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(event.kind, ChangeKind::Insert);
    assert_eq!(event.table, "service_orders");
    assert!(events.try_recv().is_err());

    handle.close();
    assert_eq!(source.closed_subscriptions(), 1);
}
