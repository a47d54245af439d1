use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use validator::Validate;

use crate::error::MarketplaceError;
use crate::models::{Doctor, EntitlementKind, EntitlementRecord, Message};

/// In-memory stand-in for the marketplace backend
///
/// Holds doctors (in insertion order), the latest entitlement record per
/// owner and kind, and all messages. Nothing is persisted.
#[derive(Debug, Default)]
pub struct MarketplaceStore {
    inner: RwLock<StoreData>,
}

#[derive(Debug, Default)]
struct StoreData {
    doctors: Vec<Doctor>,
    doctor_index: HashMap<String, usize>,
    entitlements: HashMap<(EntitlementKind, String), EntitlementRecord>,
    messages: Vec<Message>,
}

/// Store statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub doctors: usize,
    pub entitlements: usize,
    pub messages: usize,
}

impl MarketplaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a doctor, replacing any existing record with the same id in place
    pub async fn upsert_doctor(&self, doctor: Doctor) -> Result<(), MarketplaceError> {
        doctor.validate()?;

        let mut data = self.inner.write().await;
        let existing = data.doctor_index.get(&doctor.id).copied();
        match existing {
            Some(pos) => data.doctors[pos] = doctor,
            None => {
                let pos = data.doctors.len();
                data.doctor_index.insert(doctor.id.clone(), pos);
                data.doctors.push(doctor);
            }
        }
        Ok(())
    }

    pub async fn get_doctor(&self, id: &str) -> Result<Doctor, MarketplaceError> {
        let data = self.inner.read().await;
        data.doctor_index
            .get(id)
            .map(|&pos| data.doctors[pos].clone())
            .ok_or_else(|| MarketplaceError::NotFound(format!("doctor {}", id)))
    }

    pub async fn has_doctor(&self, id: &str) -> bool {
        self.inner.read().await.doctor_index.contains_key(id)
    }

    /// All doctors in insertion order
    pub async fn list_doctors(&self) -> Vec<Doctor> {
        self.inner.read().await.doctors.clone()
    }

    pub async fn get_entitlement(
        &self,
        kind: EntitlementKind,
        owner_id: &str,
    ) -> Option<EntitlementRecord> {
        self.inner
            .read()
            .await
            .entitlements
            .get(&(kind, owner_id.to_string()))
            .cloned()
    }

    /// Read, check and replace the record for one owner and kind under a single
    /// write guard. Nothing is stored when `update` fails.
    pub async fn update_entitlement<F>(
        &self,
        kind: EntitlementKind,
        owner_id: &str,
        update: F,
    ) -> Result<EntitlementRecord, MarketplaceError>
    where
        F: FnOnce(Option<&EntitlementRecord>) -> Result<EntitlementRecord, MarketplaceError>,
    {
        let key = (kind, owner_id.to_string());
        let mut data = self.inner.write().await;
        let record = update(data.entitlements.get(&key))?;
        data.entitlements.insert(key, record.clone());
        Ok(record)
    }

    /// Latest records of one kind, keyed by owner
    pub async fn entitlements_of_kind(
        &self,
        kind: EntitlementKind,
    ) -> HashMap<String, EntitlementRecord> {
        self.inner
            .read()
            .await
            .entitlements
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|((_, owner), record)| (owner.clone(), record.clone()))
            .collect()
    }

    pub async fn insert_message(&self, message: Message) {
        self.inner.write().await.messages.push(message);
    }

    /// Messages between two users in send order
    pub async fn messages_between(&self, a: &str, b: &str) -> Vec<Message> {
        self.inner
            .read()
            .await
            .messages
            .iter()
            .filter(|m| crate::core::messaging::is_between(m, a, b))
            .cloned()
            .collect()
    }

    /// True if `user_id` has sent at least one message
    pub async fn has_sent_any(&self, user_id: &str) -> bool {
        self.inner
            .read()
            .await
            .messages
            .iter()
            .any(|m| m.sender_id == user_id)
    }

    /// True if `sender` has ever written to `recipient`
    pub async fn has_written(&self, sender: &str, recipient: &str) -> bool {
        self.inner
            .read()
            .await
            .messages
            .iter()
            .any(|m| m.sender_id == sender && m.recipient_id == recipient)
    }

    pub async fn stats(&self) -> StoreStats {
        let data = self.inner.read().await;
        StoreStats {
            doctors: data.doctors.len(),
            entitlements: data.entitlements.len(),
            messages: data.messages.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::Arc;

    fn doctor(id: &str, rating: f64) -> Doctor {
        Doctor {
            id: id.to_string(),
            name: format!("Dr. {}", id),
            specialty: "Cardiology".to_string(),
            location: "Boston".to_string(),
            rating,
            boosted: false,
            available: true,
            bio: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_keeps_position() {
        let store = MarketplaceStore::new();
        store.upsert_doctor(doctor("a", 4.0)).await.unwrap();
        store.upsert_doctor(doctor("b", 4.0)).await.unwrap();
        store.upsert_doctor(doctor("a", 2.5)).await.unwrap();

        let doctors = store.list_doctors().await;
        assert_eq!(doctors.len(), 2);
        assert_eq!(doctors[0].id, "a");
        assert_eq!(doctors[0].rating, 2.5);
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_rating() {
        let store = MarketplaceStore::new();
        let err = store.upsert_doctor(doctor("a", 5.5)).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::InvalidInput(_)));
        assert!(!store.has_doctor("a").await);
    }

    #[tokio::test]
    async fn test_unknown_doctor() {
        let store = MarketplaceStore::new();
        let err = store.get_doctor("nope").await.unwrap_err();
        assert_eq!(err, MarketplaceError::NotFound("doctor nope".to_string()));
    }

    #[tokio::test]
    async fn test_entitlements_keyed_by_kind() {
        let store = MarketplaceStore::new();
        let now = Utc::now();
        let record = |kind| EntitlementRecord {
            id: "e".to_string(),
            owner_id: "doc-1".to_string(),
            kind,
            plan_id: "p".to_string(),
            started_at: now,
            expires_at: now + Duration::days(7),
            cancelled_at: None,
        };

        store
            .update_entitlement(EntitlementKind::Boost, "doc-1", |current| {
                assert!(current.is_none());
                Ok(record(EntitlementKind::Boost))
            })
            .await
            .unwrap();
        assert!(store.get_entitlement(EntitlementKind::Boost, "doc-1").await.is_some());
        assert!(store.get_entitlement(EntitlementKind::Subscription, "doc-1").await.is_none());
        assert_eq!(store.entitlements_of_kind(EntitlementKind::Boost).await.len(), 1);
    }

    fn boost(owner: &str, now: DateTime<Utc>) -> EntitlementRecord {
        EntitlementRecord {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner.to_string(),
            kind: EntitlementKind::Boost,
            plan_id: "boost-weekly".to_string(),
            started_at: now,
            expires_at: now + Duration::days(7),
            cancelled_at: None,
        }
    }

    #[tokio::test]
    async fn test_update_entitlement_failure_keeps_record() {
        let store = MarketplaceStore::new();
        let now = Utc::now();
        store
            .update_entitlement(EntitlementKind::Boost, "doc-1", |_| Ok(boost("doc-1", now)))
            .await
            .unwrap();

        let err = store
            .update_entitlement(EntitlementKind::Boost, "doc-1", |_| {
                Err(MarketplaceError::InvalidInput("nope".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MarketplaceError::InvalidInput(_)));
        assert!(store.get_entitlement(EntitlementKind::Boost, "doc-1").await.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_first_writes_admit_one() {
        let store = Arc::new(MarketplaceStore::new());
        let now = Utc::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .update_entitlement(EntitlementKind::Boost, "doc-1", |current| match current {
                            None => Ok(boost("doc-1", now)),
                            Some(_) => Err(MarketplaceError::InvalidInput("taken".to_string())),
                        })
                        .await
                })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
    }

    #[tokio::test]
    async fn test_has_sent_any() {
        let store = MarketplaceStore::new();
        store
            .insert_message(Message {
                id: "m1".to_string(),
                sender_id: "pat-1".to_string(),
                recipient_id: "doc-1".to_string(),
                body: "hi".to_string(),
                sent_at: Utc::now(),
            })
            .await;

        assert!(store.has_sent_any("pat-1").await);
        assert!(!store.has_sent_any("doc-1").await);
    }
}
