use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::domain::address::Address;
use crate::domain::types::Cep;
use crate::models::address::ViaCepResponse;
use crate::repository::AddressLookup;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::rest::base_url;

/// Postal code lookups against the public ViaCEP service.
#[derive(Clone)]
pub struct ViaCepClient {
    http: Client,
    base: Url,
}

impl ViaCepClient {
    pub fn new(base_url_str: &str, timeout: Duration) -> RepositoryResult<Self> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            base: base_url(base_url_str)?,
        })
    }

    fn lookup_url(&self, cep: &Cep) -> RepositoryResult<Url> {
        Ok(self.base.join(&format!("{}/json/", cep.as_str()))?)
    }
}

#[async_trait]
impl AddressLookup for ViaCepClient {
    async fn lookup_address(&self, cep: &Cep) -> RepositoryResult<Option<Address>> {
        let response = self.http.get(self.lookup_url(cep)?).send().await?;

        if response.status() == StatusCode::BAD_REQUEST {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RepositoryError::Remote {
                status: response.status().as_u16(),
                message: format!("CEP lookup failed for {cep}"),
            });
        }

        let body: ViaCepResponse = response.json().await?;
        if body.is_not_found() {
            return Ok(None);
        }
        Ok(Some(body.into()))
    }
}
