use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use launchkit_core::TenantId;

/// Durable record of one generated tenant application.
///
/// `source_code` is the full text handed over by the build stage. The record
/// is never mutated in place; a regenerated application gets a fresh id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    pub id: TenantId,
    pub display_name: String,
    pub source_code: String,
    pub created_at: DateTime<Utc>,
}

impl TenantRecord {
    pub fn new(
        id: TenantId,
        display_name: impl Into<String>,
        source_code: impl Into<String>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            source_code: source_code.into(),
            created_at: Utc::now(),
        }
    }
}
