//! REST client for the hosted record store.
//!
//! Speaks the PostgREST dialect used by the hosted backend:
//!
//! | Operation      | Request                                              |
//! |----------------|------------------------------------------------------|
//! | bulk insert    | `POST {url}/rest/v1/{table}` with a JSON array        |
//! | inventory      | same, upserting on `part_id,center_id`                |
//! | fetch          | `GET {url}/rest/v1/{table}?select=*`                  |

use reqwest::Client;
use serde_json::Value;

use super::{ensure_importable, RecordStore};
use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::models::{EntityKind, MappedRecord};

/// Upsert key of the inventory table.
const INVENTORY_CONFLICT_KEY: &str = "part_id,center_id";

/// Client for the hosted store's REST interface.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Build from configuration; both URL and key must be set.
    pub fn from_config(config: &Config) -> StoreResult<Self> {
        let url = config
            .store_url
            .as_deref()
            .ok_or(StoreError::MissingConfig("MAINTDESK_STORE_URL"))?;
        let key = config
            .store_key
            .as_deref()
            .ok_or(StoreError::MissingConfig("MAINTDESK_STORE_KEY"))?;
        Ok(Self::new(url, key))
    }

    /// Table endpoint for `kind`.
    pub fn endpoint(&self, kind: EntityKind) -> String {
        format!("{}/rest/v1/{}", self.base_url, kind.as_str())
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

impl RecordStore for RestStore {
    async fn bulk_insert(&self, kind: EntityKind, records: &[MappedRecord]) -> StoreResult<usize> {
        ensure_importable(kind)?;

        let mut request = self.authorized(self.client.post(self.endpoint(kind)));
        request = if kind == EntityKind::Inventory {
            request
                .query(&[("on_conflict", INVENTORY_CONFLICT_KEY)])
                .header("Prefer", "return=representation,resolution=merge-duplicates")
        } else {
            request.header("Prefer", "return=representation")
        };

        let response = request.json(records).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let stored: Vec<Value> = response.json().await?;
        Ok(stored.len())
    }

    async fn fetch_all(&self, kind: EntityKind) -> StoreResult<Vec<MappedRecord>> {
        let response = self
            .authorized(self.client.get(self.endpoint(kind)))
            .query(&[("select", "*")])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
