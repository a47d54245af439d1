use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query string of the doctor search endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(rename = "availableOnly", default)]
    pub available_only: bool,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Request to purchase a subscription or boost
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PurchaseRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "owner_id", rename = "ownerId")]
    pub owner_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "plan_id", rename = "planId")]
    pub plan_id: String,
}

/// Request to extend an active entitlement
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenewRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "plan_id", rename = "planId")]
    pub plan_id: String,
}

/// Request to send a message
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "sender_id", rename = "senderId")]
    pub sender_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "recipient_id", rename = "recipientId")]
    pub recipient_id: String,
    /// Bounds are checked after trimming, when the message is composed
    pub body: String,
}

/// Query string of the conversation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationParams {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "peerId")]
    pub peer_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_body_bounds_left_to_composition() {
        let request = SendMessageRequest {
            sender_id: "pat-1".to_string(),
            recipient_id: "doc-1".to_string(),
            body: format!("{}   ", "x".repeat(2000)),
        };
        assert!(request.validate().is_ok());

        let request = SendMessageRequest {
            sender_id: String::new(),
            ..request
        };
        assert!(request.validate().is_err());
    }
}
