use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::scrape::Enrichment;

/// Identifier of one backlog room. Immutable once read from the backlog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The row written to the `rooms` table for one backlog item.
///
/// Serializes flat: `{"id": ..., "failed": ..., <enrichment fields>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: RoomId,
    pub failed: bool,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RoomRecord {
    /// Successful scrape: every enrichment field plus `failed = false`.
    /// `id` and `failed` from the service never override ours.
    pub fn enriched(id: &RoomId, enrichment: Enrichment) -> Self {
        let mut fields = enrichment.into_fields();
        fields.remove("id");
        fields.remove("failed");
        Self {
            id: id.clone(),
            failed: false,
            fields,
        }
    }

    /// Failure marker: identifier and `failed = true`, no enrichment fields.
    pub fn failed(id: &RoomId) -> Self {
        Self {
            id: id.clone(),
            failed: true,
            fields: Map::new(),
        }
    }
}
