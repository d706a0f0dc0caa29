//! PostgREST-style HTTP client for the hosted backend.

use std::time::Duration;

use reqwest::header::{CONTENT_RANGE, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use url::Url;

use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::remote::{Predicate, QueryResponse, RemoteQuery};

/// Ensures `base` ends with a slash so relative joins append to its path.
pub(crate) fn base_url(base: &str) -> RepositoryResult<Url> {
    Ok(Url::parse(&format!("{}/", base.trim_end_matches('/')))?)
}

/// Query string of a read: `select`, one `column=op.value` pair per
/// predicate, then ordering and window.
pub fn query_pairs(query: &RemoteQuery) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), query.select.clone())];

    pairs.extend(query.predicates.iter().map(predicate_pair));

    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        pairs.push(("order".to_string(), format!("{}.{direction}", order.column)));
    }
    if query.offset > 0 {
        pairs.push(("offset".to_string(), query.offset.to_string()));
    }
    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }

    pairs
}

fn predicate_pair(predicate: &Predicate) -> (String, String) {
    (
        predicate.column().to_string(),
        format!("{}.{}", predicate.operator(), predicate.value()),
    )
}

/// Total row count from a `Content-Range` header such as `0-9/23` or `*/0`.
pub fn parse_content_range(header: &str) -> Option<usize> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.parse().ok()
}

fn content_range(response: &Response) -> Option<usize> {
    response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_range)
}

/// Reads the error body; PostgREST answers with `{"message": ...}`.
async fn remote_error(response: Response) -> RepositoryError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    RepositoryError::Remote { status, message }
}

#[derive(Clone)]
pub struct PostgrestClient {
    http: Client,
    base: Url,
    api_key: String,
}

impl PostgrestClient {
    pub fn new(backend_url: &str, api_key: &str, timeout: Duration) -> RepositoryResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base: base_url(backend_url)?.join("rest/v1/")?,
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> RepositoryResult<Url> {
        Ok(self.base.join(path)?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    pub async fn select(&self, query: &RemoteQuery) -> RepositoryResult<QueryResponse> {
        let mut request = self
            .authorized(self.http.get(self.endpoint(&query.table)?))
            .query(&query_pairs(query));
        if query.count_exact {
            request = request.header("Prefer", HeaderValue::from_static("count=exact"));
        }

        let response = request.send().await?;

        // Asking for a window past the last row.
        if response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(QueryResponse {
                rows: Vec::new(),
                count: content_range(&response).or(Some(0)),
            });
        }
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }

        let count = if query.count_exact {
            content_range(&response)
        } else {
            None
        };
        let rows: Vec<Value> = response.json().await?;
        Ok(QueryResponse { rows, count })
    }

    pub async fn update(
        &self,
        table: &str,
        payload: Value,
        matching: &Predicate,
    ) -> RepositoryResult<()> {
        let response = self
            .authorized(self.http.patch(self.endpoint(table)?))
            .query(&[predicate_pair(matching)])
            .header("Prefer", HeaderValue::from_static("return=minimal"))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        Ok(())
    }

    pub async fn insert(&self, table: &str, rows: Value) -> RepositoryResult<()> {
        let response = self
            .authorized(self.http.post(self.endpoint(table)?))
            .header("Prefer", HeaderValue::from_static("return=minimal"))
            .json(&rows)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        Ok(())
    }

    pub async fn rpc(&self, function: &str, args: Value) -> RepositoryResult<Value> {
        let response = self
            .authorized(self.http.post(self.endpoint(&format!("rpc/{function}"))?))
            .json(&args)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_pairs_follow_filter_syntax() {
        let query = RemoteQuery::new("orders")
            .select("*,client:clients(id,name)")
            .filter(Predicate::eq("status", "nova"))
            .filter(Predicate::gte("created_at", "2025-05-01T00:00:00+00:00"))
            .order_by("created_at", false)
            .window(20, 10)
            .exact_count();

        let pairs = query_pairs(&query);

        let expected: Vec<(String, String)> = [
            ("select", "*,client:clients(id,name)"),
            ("status", "eq.nova"),
            ("created_at", "gte.2025-05-01T00:00:00+00:00"),
            ("order", "created_at.desc"),
            ("offset", "20"),
            ("limit", "10"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn first_page_has_no_offset() {
        let query = RemoteQuery::new("orders").window(0, 10);
        let pairs = query_pairs(&query);

        assert!(!pairs.iter().any(|(k, _)| k == "offset"));
        assert!(pairs.contains(&("limit".to_string(), "10".to_string())));
    }

    #[test]
    fn content_range_yields_total() {
        assert_eq!(parse_content_range("0-9/23"), Some(23));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("20-22/23"), Some(23));
        assert_eq!(parse_content_range("0-9/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn endpoints_keep_backend_path() {
        let client = PostgrestClient::new(
            "https://project.supabase.co",
            "anon",
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(
            client.endpoint("orders").unwrap().as_str(),
            "https://project.supabase.co/rest/v1/orders"
        );
        assert_eq!(
            client.endpoint("rpc/get_or_create_client_v1").unwrap().as_str(),
            "https://project.supabase.co/rest/v1/rpc/get_or_create_client_v1"
        );
    }
}
