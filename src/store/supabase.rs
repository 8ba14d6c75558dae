//! Supabase (PostgREST) implementation of the backlog source and record store.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

use super::{BacklogSource, RecordStore, RoomId, RoomRecord, StoreError};
use crate::config::SyncConfig;

/// Upserts replace the row on an `id` conflict instead of skipping it.
const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";

pub struct SupabaseStore {
    client: Client,
    base_url: String,
    service_role: String,
    backlog_view: String,
    backlog_column: String,
    target_table: String,
}

impl SupabaseStore {
    pub fn new(config: &SyncConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            service_role: config.supabase_service_role.clone(),
            backlog_view: config.backlog_view.clone(),
            backlog_column: config.backlog_column.clone(),
            target_table: config.target_table.clone(),
        })
    }

    fn rest_url(&self, relation: &str) -> String {
        format!("{}/rest/v1/{relation}", self.base_url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_role)
            .bearer_auth(&self.service_role)
    }
}

impl BacklogSource for SupabaseStore {
    async fn pending_rooms(&self) -> Result<Vec<RoomId>, StoreError> {
        let select = format!("{}::text", self.backlog_column);
        let response = self
            .authorized(self.client.get(self.rest_url(&self.backlog_view)))
            .query(&[("select", select.as_str())])
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let bytes = response.bytes().await?;
        let rows: Vec<Value> = serde_json::from_slice(&bytes).map_err(|e| {
            StoreError::InvalidRow(format!("backlog response is not a JSON array: {e}"))
        })?;

        rows.iter()
            .map(|row| room_id_from_row(row, &self.backlog_column))
            .collect()
    }
}

impl RecordStore for SupabaseStore {
    async fn upsert(&self, record: &RoomRecord) -> Result<(), StoreError> {
        let response = self
            .authorized(self.client.post(self.rest_url(&self.target_table)))
            .query(&[("on_conflict", "id")])
            .header("Prefer", UPSERT_PREFER)
            .json(record)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

/// Turns a non-2xx PostgREST response into [`StoreError::Rejected`], using
/// the `message` field of its error body when present.
async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn room_id_from_row(row: &Value, column: &str) -> Result<RoomId, StoreError> {
    match row.get(column) {
        Some(Value::String(id)) => Ok(RoomId::new(id.as_str())),
        Some(Value::Number(id)) => Ok(RoomId::new(id.to_string())),
        Some(Value::Null) | None => Err(StoreError::InvalidRow(format!(
            "missing `{column}` in {row}"
        ))),
        Some(other) => Err(StoreError::InvalidRow(format!(
            "unsupported `{column}` value {other}"
        ))),
    }
}
