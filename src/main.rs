//! Mounts the lead board against the configured backend and logs every
//! published state until interrupted.
//!
//! Usage: `fieldcrm-leads [query]`, where `query` carries the board filters,
//! e.g. `status=nova&dateRange=7d&page=1`. `fieldcrm-leads cep <code>` looks
//! up a postal code instead.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use config::Config;
use dotenvy::dotenv;

use fieldcrm_leads::dto::leads::LeadListState;
use fieldcrm_leads::forms::lead_filters::LeadFiltersForm;
use fieldcrm_leads::models::config::LeadsConfig;
use fieldcrm_leads::repository::RemoteRepository;
use fieldcrm_leads::repository::supabase::SupabaseSource;
use fieldcrm_leads::repository::viacep::ViaCepClient;
use fieldcrm_leads::services::lead_board::LeadBoard;
use fieldcrm_leads::services::lead_capture::lookup_address;
use fieldcrm_leads::{APP_ENV_PREFIX, APP_ENV_VAR};

fn log_state(state: &LeadListState) {
    if state.loading {
        log::info!("Loading leads...");
        return;
    }

    log::info!(
        "Page {} of {} ({} leads match)",
        state.page + 1,
        state.total_pages().max(1),
        state.total
    );
    for lead in &state.leads {
        let client = lead
            .client
            .as_ref()
            .map(|client| client.name.as_str())
            .unwrap_or("-");
        log::info!(
            "[{}] {} {} {} {}",
            lead.priority,
            lead.protocol,
            lead.status,
            lead.service_type,
            client
        );
    }
}

async fn run_cep_lookup(leads_config: &LeadsConfig, raw_cep: &str) {
    let client = match ViaCepClient::new(
        &leads_config.viacep_url,
        Duration::from_secs(leads_config.request_timeout_secs),
    ) {
        Ok(client) => client,
        Err(err) => {
            log::error!("Failed to set up the CEP client: {err}");
            std::process::exit(1);
        }
    };

    match lookup_address(&client, raw_cep).await {
        Some(address) => log::info!(
            "{}, {} - {}/{}",
            address.street,
            address.neighborhood,
            address.city,
            address.uf
        ),
        None => log::warn!("No address found for {raw_cep:?}"),
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Select config profile (defaults to `local`).
    let app_env = env::var(APP_ENV_VAR).unwrap_or_else(|_| "local".into());

    let settings = Config::builder()
        // Add `./config/default.yaml`
        .add_source(config::File::with_name("config/default"))
        // Add environment-specific overrides
        .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
        // Add settings from the environment (with a prefix of APP)
        .add_source(config::Environment::with_prefix(APP_ENV_PREFIX))
        .build();

    let settings = match settings {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("Error loading settings: {}", err);
            std::process::exit(1);
        }
    };

    let leads_config = match settings.try_deserialize::<LeadsConfig>() {
        Ok(leads_config) => leads_config,
        Err(err) => {
            log::error!("Error loading leads config: {}", err);
            std::process::exit(1);
        }
    };

    let mut args = env::args().skip(1);
    let query = args.next().unwrap_or_default();
    if query == "cep" {
        run_cep_lookup(&leads_config, &args.next().unwrap_or_default()).await;
        return;
    }

    let (filters, page) = match LeadFiltersForm::parse(&query).and_then(LeadFiltersForm::into_filters)
    {
        Ok(parsed) => parsed,
        Err(err) => {
            log::error!("Invalid filters {query:?}: {err}");
            std::process::exit(2);
        }
    };

    let source = match SupabaseSource::new(&leads_config) {
        Ok(source) => source,
        Err(err) => {
            log::error!("Failed to set up the backend client: {err}");
            std::process::exit(1);
        }
    };
    let repo = Arc::new(RemoteRepository::from_config(
        Arc::new(source),
        &leads_config,
    ));

    log::info!("Watching {} on {}", repo.table(), leads_config.backend_url);

    let board = LeadBoard::mount_with(repo, filters, page).await;
    if !board.is_live() {
        log::warn!("Live updates are unavailable; showing a single snapshot");
    }

    let mut updates = board.subscribe();
    log_state(&updates.borrow_and_update());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("Shutting down");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                log_state(&updates.borrow_and_update());
            }
        }
    }

    board.unmount();
}
