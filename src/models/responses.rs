use serde::{Deserialize, Serialize};
use crate::core::entitlement::EntitlementState;
use crate::models::domain::{EntitlementKind, EntitlementRecord, Message, RankedDoctor};
use crate::services::{CacheStats, StoreStats};

/// Response for the doctor search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<RankedDoctor>,
    pub total_candidates: usize,
}

/// Entitlement as seen by the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementResponse {
    pub owner_id: String,
    pub kind: EntitlementKind,
    pub state: EntitlementState,
    pub can_access: bool,
    pub renews_at: Option<chrono::DateTime<chrono::Utc>>,
    pub record: Option<EntitlementRecord>,
}

/// Messages between two users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub messages: Vec<Message>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub store: StoreStats,
    pub cache: CacheStats,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}
