use chrono::{DateTime, Utc};

use crate::core::entitlement::can_access;
use crate::error::MarketplaceError;
use crate::models::{EntitlementRecord, Message};

/// Longest accepted message body, in characters
pub const MAX_BODY_CHARS: usize = 2000;

/// Who is writing to whom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Any message that is not a doctor's reply; needs a subscription
    Subscribed,
    /// Doctor answering a patient who wrote to them first
    DoctorReply,
}

/// Decide whether a message may be sent
///
/// A doctor replying to a patient needs no subscription. Everyone else needs
/// a subscription that grants access at `now`.
pub fn check_send(
    route: Route,
    recipient_id: &str,
    subscription: Option<&EntitlementRecord>,
    now: DateTime<Utc>,
) -> Result<(), MarketplaceError> {
    match route {
        Route::DoctorReply => Ok(()),
        Route::Subscribed if can_access(subscription, now) => Ok(()),
        Route::Subscribed => Err(MarketplaceError::EntitlementRequired(recipient_id.to_string())),
    }
}

/// Trim and bound-check a message body
pub fn normalize_body(body: &str) -> Result<String, MarketplaceError> {
    let trimmed = body.trim();
    let chars = trimmed.chars().count();

    if chars == 0 {
        return Err(MarketplaceError::InvalidInput("message body is empty".to_string()));
    }
    if chars > MAX_BODY_CHARS {
        return Err(MarketplaceError::InvalidInput(format!(
            "message body exceeds {} characters",
            MAX_BODY_CHARS
        )));
    }

    Ok(trimmed.to_string())
}

/// Build a new message
pub fn compose(sender_id: &str, recipient_id: &str, body: String, now: DateTime<Utc>) -> Message {
    Message {
        id: uuid::Uuid::new_v4().to_string(),
        sender_id: sender_id.to_string(),
        recipient_id: recipient_id.to_string(),
        body,
        sent_at: now,
    }
}

/// True if the message is between `a` and `b`, either direction
#[inline]
pub fn is_between(message: &Message, a: &str, b: &str) -> bool {
    (message.sender_id == a && message.recipient_id == b)
        || (message.sender_id == b && message.recipient_id == a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntitlementKind;
    use chrono::Duration;

    fn subscription(expires_at: DateTime<Utc>, cancelled: bool) -> EntitlementRecord {
        EntitlementRecord {
            id: "ent-1".to_string(),
            owner_id: "pat-1".to_string(),
            kind: EntitlementKind::Subscription,
            plan_id: "patient-monthly".to_string(),
            started_at: expires_at - Duration::days(30),
            expires_at,
            cancelled_at: if cancelled { Some(expires_at - Duration::days(10)) } else { None },
        }
    }

    #[test]
    fn test_requires_subscription() {
        let now = Utc::now();
        let err = check_send(Route::Subscribed, "doc-1", None, now).unwrap_err();
        assert_eq!(err, MarketplaceError::EntitlementRequired("doc-1".to_string()));
    }

    #[test]
    fn test_cancelled_subscription_still_sends() {
        let now = Utc::now();
        let sub = subscription(now + Duration::days(3), true);
        assert!(check_send(Route::Subscribed, "doc-1", Some(&sub), now).is_ok());
    }

    #[test]
    fn test_expired_subscription_rejected() {
        let now = Utc::now();
        let sub = subscription(now - Duration::days(1), false);
        assert!(check_send(Route::Subscribed, "doc-1", Some(&sub), now).is_err());
    }

    #[test]
    fn test_doctor_reply_needs_no_subscription() {
        assert!(check_send(Route::DoctorReply, "pat-1", None, Utc::now()).is_ok());
    }

    #[test]
    fn test_normalize_body() {
        assert_eq!(normalize_body("  hello  ").unwrap(), "hello");
        assert!(normalize_body("   ").is_err());
        assert!(normalize_body(&"x".repeat(MAX_BODY_CHARS + 1)).is_err());
        assert!(normalize_body(&"x".repeat(MAX_BODY_CHARS)).is_ok());
    }
}
