//! Configuration model loaded from external sources.

use serde::Deserialize;

fn default_leads_table() -> String {
    "orders".to_string()
}

fn default_lead_select() -> String {
    "*,client:clients(id,name,phone,address,city,neighborhood,latitude,longitude)".to_string()
}

fn default_client_procedure() -> String {
    "get_or_create_client_v1".to_string()
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_heartbeat_secs() -> u64 {
    25
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_viacep_url() -> String {
    "https://viacep.com.br/ws".to_string()
}

#[derive(Clone, Debug, Deserialize)]
/// Settings of the hosted backend and the lead board.
pub struct LeadsConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub backend_url: String,
    /// Public API key sent as `apikey` and bearer token.
    pub api_key: String,
    #[serde(default = "default_leads_table")]
    pub leads_table: String,
    /// Column list with the nested client join.
    #[serde(default = "default_lead_select")]
    pub lead_select: String,
    #[serde(default = "default_client_procedure")]
    pub client_procedure: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_viacep_url")]
    pub viacep_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_settings() {
        let config: LeadsConfig = serde_json::from_value(serde_json::json!({
            "backend_url": "https://example.supabase.co",
            "api_key": "anon"
        }))
        .unwrap();

        assert_eq!(config.leads_table, "orders");
        assert_eq!(config.schema, "public");
        assert_eq!(config.heartbeat_interval_secs, 25);
        assert!(config.lead_select.starts_with("*,client:clients("));
    }
}
