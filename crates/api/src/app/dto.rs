use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use launchkit_host::{LoadStatus, RuntimeEntrySnapshot};
use launchkit_store::TenantRecord;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub prompt: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: String,
}

/// Tenant metadata: the durable record joined with its runtime state.
#[derive(Debug, Serialize)]
pub struct TenantMetadata {
    pub id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub load_status: LoadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TenantMetadata {
    pub fn from_parts(record: &TenantRecord, entry: Option<&RuntimeEntrySnapshot>) -> Self {
        let (load_status, error) = match entry {
            Some(entry) => (entry.load_status, entry.error.clone()),
            // A stored tenant that was never activated counts as failed; it
            // must not silently disappear.
            None => (
                LoadStatus::Failed,
                Some("tenant is not activated".to_string()),
            ),
        };
        Self {
            id: record.id.to_string(),
            display_name: record.display_name.clone(),
            created_at: record.created_at,
            load_status,
            error,
        }
    }
}
