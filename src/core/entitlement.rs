//! Entitlement state machine for subscriptions and boosts.
//!
//! Records are immutable. The state of a record is derived from its
//! timestamps and the current time, and every transition returns a new
//! record.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MarketplaceError;
use crate::models::{Doctor, EntitlementKind, EntitlementRecord, Plan};

/// Entitlement state at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EntitlementState {
    /// Never purchased
    None,
    /// Paid and running; renews at `expires_at`
    Active {
        #[serde(rename = "expiresAt")]
        expires_at: DateTime<Utc>,
    },
    /// Cancelled by the owner. Access continues until `expires_at`.
    Cancelled {
        #[serde(rename = "cancelledAt")]
        cancelled_at: DateTime<Utc>,
        #[serde(rename = "expiresAt")]
        expires_at: DateTime<Utc>,
    },
    /// Past expiry. No access.
    Expired {
        #[serde(rename = "expiredAt")]
        expired_at: DateTime<Utc>,
    },
}

/// Data-less view of `EntitlementState` for transition rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitlementStatus {
    None,
    Active,
    Cancelled,
    Expired,
}

impl EntitlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntitlementStatus::None => "none",
            EntitlementStatus::Active => "active",
            EntitlementStatus::Cancelled => "cancelled",
            EntitlementStatus::Expired => "expired",
        }
    }

    /// Returns true if moving from self to target is allowed.
    pub fn can_transition_to(&self, target: &Self) -> bool {
        use EntitlementStatus as S;
        matches!(
            (self, target),
            (S::None, S::Active)
                | (S::Active, S::Active) // renewal
                | (S::Active, S::Cancelled)
                | (S::Active, S::Expired)
                | (S::Cancelled, S::Active)
                | (S::Cancelled, S::Expired)
                | (S::Expired, S::Active) // re-purchase
        )
    }

    /// All states reachable from this one.
    pub fn valid_transitions(&self) -> Vec<Self> {
        use EntitlementStatus as S;
        match self {
            S::None => vec![S::Active],
            S::Active => vec![S::Active, S::Cancelled, S::Expired],
            S::Cancelled => vec![S::Active, S::Expired],
            S::Expired => vec![S::Active],
        }
    }
}

impl std::fmt::Display for EntitlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EntitlementState {
    /// Derive the state of an optional record at `now`.
    ///
    /// Expiry is exclusive: at exactly `expires_at` the record is expired.
    pub fn derive(record: Option<&EntitlementRecord>, now: DateTime<Utc>) -> Self {
        let Some(record) = record else {
            return EntitlementState::None;
        };

        if now >= record.expires_at {
            return EntitlementState::Expired {
                expired_at: record.expires_at,
            };
        }

        match record.cancelled_at {
            Some(cancelled_at) => EntitlementState::Cancelled {
                cancelled_at,
                expires_at: record.expires_at,
            },
            None => EntitlementState::Active {
                expires_at: record.expires_at,
            },
        }
    }

    pub fn status(&self) -> EntitlementStatus {
        match self {
            EntitlementState::None => EntitlementStatus::None,
            EntitlementState::Active { .. } => EntitlementStatus::Active,
            EntitlementState::Cancelled { .. } => EntitlementStatus::Cancelled,
            EntitlementState::Expired { .. } => EntitlementStatus::Expired,
        }
    }

    /// Active, or Cancelled with expiry still ahead of `now`.
    pub fn can_access(&self, now: DateTime<Utc>) -> bool {
        match self {
            EntitlementState::Active { .. } => true,
            EntitlementState::Cancelled { expires_at, .. } => *expires_at > now,
            EntitlementState::None | EntitlementState::Expired { .. } => false,
        }
    }

    /// Next renewal date. Cancelled entitlements do not renew.
    pub fn renews_at(&self) -> Option<DateTime<Utc>> {
        match self {
            EntitlementState::Active { expires_at } => Some(*expires_at),
            _ => None,
        }
    }
}

/// Whether the owner of `record` may use it at `now`
pub fn can_access(record: Option<&EntitlementRecord>, now: DateTime<Utc>) -> bool {
    EntitlementState::derive(record, now).can_access(now)
}

fn check_transition(
    state: &EntitlementState,
    kind: EntitlementKind,
    action: &'static str,
    allowed_from: &[EntitlementStatus],
    target: EntitlementStatus,
) -> Result<(), MarketplaceError> {
    let from = state.status();
    if allowed_from.contains(&from) && from.can_transition_to(&target) {
        Ok(())
    } else {
        tracing::warn!("Rejected {} of {} in state {}", action, kind, from);
        Err(MarketplaceError::InvalidTransition {
            kind,
            action,
            state: from.as_str(),
        })
    }
}

/// `from` pushed forward by the plan duration, rejected when it leaves the calendar range
fn extend(from: DateTime<Utc>, plan: &Plan) -> Result<DateTime<Utc>, MarketplaceError> {
    from.checked_add_signed(plan.duration()).ok_or_else(|| {
        MarketplaceError::InvalidInput(format!(
            "plan {} extends expiry past the supported date range",
            plan.id
        ))
    })
}

fn check_plan(plan: &Plan, kind: EntitlementKind) -> Result<(), MarketplaceError> {
    if plan.kind == kind {
        Ok(())
    } else {
        Err(MarketplaceError::InvalidPlan(plan.id.clone()))
    }
}

/// None/Expired -> Active. Creates a fresh record.
pub fn purchase(
    owner_id: &str,
    plan: &Plan,
    current: Option<&EntitlementRecord>,
    now: DateTime<Utc>,
) -> Result<EntitlementRecord, MarketplaceError> {
    let state = EntitlementState::derive(current, now);
    check_transition(
        &state,
        plan.kind,
        "purchase",
        &[EntitlementStatus::None, EntitlementStatus::Expired],
        EntitlementStatus::Active,
    )?;
    let expires_at = extend(now, plan)?;

    Ok(EntitlementRecord {
        id: uuid::Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        kind: plan.kind,
        plan_id: plan.id.clone(),
        started_at: now,
        expires_at,
        cancelled_at: None,
    })
}

/// Active -> Active. Extends expiry by the plan duration.
pub fn renew(
    record: &EntitlementRecord,
    plan: &Plan,
    now: DateTime<Utc>,
) -> Result<EntitlementRecord, MarketplaceError> {
    check_plan(plan, record.kind)?;
    let state = EntitlementState::derive(Some(record), now);
    check_transition(
        &state,
        record.kind,
        "renew",
        &[EntitlementStatus::Active],
        EntitlementStatus::Active,
    )?;
    let expires_at = extend(record.expires_at, plan)?;

    Ok(EntitlementRecord {
        plan_id: plan.id.clone(),
        expires_at,
        ..record.clone()
    })
}

/// Active -> Cancelled. Expiry is unchanged.
pub fn cancel(
    record: &EntitlementRecord,
    now: DateTime<Utc>,
) -> Result<EntitlementRecord, MarketplaceError> {
    let state = EntitlementState::derive(Some(record), now);
    check_transition(
        &state,
        record.kind,
        "cancel",
        &[EntitlementStatus::Active],
        EntitlementStatus::Cancelled,
    )?;

    Ok(EntitlementRecord {
        cancelled_at: Some(now),
        ..record.clone()
    })
}

/// Cancelled -> Active, only while the record has not expired.
pub fn reactivate(
    record: &EntitlementRecord,
    now: DateTime<Utc>,
) -> Result<EntitlementRecord, MarketplaceError> {
    let state = EntitlementState::derive(Some(record), now);
    check_transition(
        &state,
        record.kind,
        "reactivate",
        &[EntitlementStatus::Cancelled],
        EntitlementStatus::Active,
    )?;

    Ok(EntitlementRecord {
        cancelled_at: None,
        ..record.clone()
    })
}

/// Replace each doctor's stored boost flag with its boost entitlement, if any.
pub fn apply_boosts(
    doctors: Vec<Doctor>,
    boosts: &HashMap<String, EntitlementRecord>,
    now: DateTime<Utc>,
) -> Vec<Doctor> {
    doctors
        .into_iter()
        .map(|mut doctor| {
            if let Some(record) = boosts.get(&doctor.id) {
                doctor.boosted = can_access(Some(record), now);
            }
            doctor
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    fn monthly() -> Plan {
        Plan {
            id: "patient-monthly".to_string(),
            kind: EntitlementKind::Subscription,
            name: "Monthly".to_string(),
            duration_days: 30,
            price_cents: 1999,
        }
    }

    fn boost_plan() -> Plan {
        Plan {
            id: "boost-weekly".to_string(),
            kind: EntitlementKind::Boost,
            name: "Weekly boost".to_string(),
            duration_days: 7,
            price_cents: 999,
        }
    }

    #[test]
    fn test_no_record_is_none() {
        let state = EntitlementState::derive(None, t0());
        assert_eq!(state, EntitlementState::None);
        assert!(!state.can_access(t0()));
        assert_eq!(state.renews_at(), None);
    }

    #[test]
    fn test_purchase_activates() {
        let record = purchase("pat-1", &monthly(), None, t0()).unwrap();
        assert_eq!(record.expires_at, t0() + Duration::days(30));
        assert_eq!(record.kind, EntitlementKind::Subscription);

        let state = EntitlementState::derive(Some(&record), t0());
        assert_eq!(state.status(), EntitlementStatus::Active);
        assert_eq!(state.renews_at(), Some(record.expires_at));
        assert!(state.can_access(t0()));
    }

    #[test]
    fn test_purchase_rejected_while_active() {
        let record = purchase("pat-1", &monthly(), None, t0()).unwrap();
        let err = purchase("pat-1", &monthly(), Some(&record), t0() + Duration::days(1)).unwrap_err();
        assert!(matches!(err, MarketplaceError::InvalidTransition { action: "purchase", state: "active", .. }));
    }

    #[test]
    fn test_purchase_after_expiry() {
        let record = purchase("pat-1", &monthly(), None, t0()).unwrap();
        let later = t0() + Duration::days(45);
        let fresh = purchase("pat-1", &monthly(), Some(&record), later).unwrap();

        assert_ne!(fresh.id, record.id);
        assert_eq!(fresh.started_at, later);
        assert!(can_access(Some(&fresh), later));
    }

    #[test]
    fn test_cancelled_keeps_access_until_expiry() {
        let record = purchase("pat-1", &monthly(), None, t0()).unwrap();
        let cancelled = cancel(&record, t0() + Duration::days(10)).unwrap();

        let during = t0() + Duration::days(29);
        let state = EntitlementState::derive(Some(&cancelled), during);
        assert_eq!(state.status(), EntitlementStatus::Cancelled);
        assert!(state.can_access(during));
        assert_eq!(state.renews_at(), None);

        let at_expiry = cancelled.expires_at;
        let state = EntitlementState::derive(Some(&cancelled), at_expiry);
        assert_eq!(state.status(), EntitlementStatus::Expired);
        assert!(!state.can_access(at_expiry));
    }

    #[test]
    fn test_cancelled_state_past_expiry_denies_access() {
        let expires_at = t0();
        let state = EntitlementState::Cancelled {
            cancelled_at: t0() - Duration::days(3),
            expires_at,
        };
        assert!(!state.can_access(expires_at + Duration::seconds(1)));
        assert!(state.can_access(expires_at - Duration::seconds(1)));
    }

    #[test]
    fn test_reactivate_before_expiry() {
        let record = purchase("pat-1", &monthly(), None, t0()).unwrap();
        let cancelled = cancel(&record, t0() + Duration::days(1)).unwrap();
        let restored = reactivate(&cancelled, t0() + Duration::days(2)).unwrap();

        assert_eq!(restored.cancelled_at, None);
        assert_eq!(restored.expires_at, record.expires_at);
        assert_eq!(
            EntitlementState::derive(Some(&restored), t0() + Duration::days(2)).status(),
            EntitlementStatus::Active
        );
    }

    #[test]
    fn test_reactivate_after_expiry_rejected() {
        let record = purchase("pat-1", &monthly(), None, t0()).unwrap();
        let cancelled = cancel(&record, t0() + Duration::days(1)).unwrap();
        let err = reactivate(&cancelled, t0() + Duration::days(31)).unwrap_err();
        assert!(matches!(err, MarketplaceError::InvalidTransition { state: "expired", .. }));
    }

    #[test]
    fn test_cancel_requires_active() {
        let record = purchase("pat-1", &monthly(), None, t0()).unwrap();
        let cancelled = cancel(&record, t0()).unwrap();
        assert!(cancel(&cancelled, t0()).is_err());
        assert!(cancel(&record, t0() + Duration::days(30)).is_err());
    }

    #[test]
    fn test_renew_extends_from_expiry() {
        let record = purchase("pat-1", &monthly(), None, t0()).unwrap();
        let renewed = renew(&record, &monthly(), t0() + Duration::days(5)).unwrap();
        assert_eq!(renewed.expires_at, t0() + Duration::days(60));
        assert_eq!(renewed.id, record.id);
    }

    #[test]
    fn test_renew_rejects_other_kind_plan() {
        let record = purchase("pat-1", &monthly(), None, t0()).unwrap();
        let err = renew(&record, &boost_plan(), t0()).unwrap_err();
        assert_eq!(err, MarketplaceError::InvalidPlan("boost-weekly".to_string()));
    }

    #[test]
    fn test_out_of_range_duration_rejected() {
        let endless = Plan {
            duration_days: 200_000_000,
            ..monthly()
        };
        let err = purchase("pat-1", &endless, None, t0()).unwrap_err();
        assert!(matches!(err, MarketplaceError::InvalidInput(_)));

        let record = purchase("pat-1", &monthly(), None, t0()).unwrap();
        let err = renew(&record, &endless, t0()).unwrap_err();
        assert!(matches!(err, MarketplaceError::InvalidInput(_)));
    }

    #[test]
    fn test_transition_table() {
        use EntitlementStatus as S;
        assert!(S::None.can_transition_to(&S::Active));
        assert!(!S::None.can_transition_to(&S::Cancelled));
        assert!(!S::Expired.can_transition_to(&S::Cancelled));
        assert!(S::Cancelled.can_transition_to(&S::Active));

        for from in [S::None, S::Active, S::Cancelled, S::Expired] {
            for to in from.valid_transitions() {
                assert!(from.can_transition_to(&to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_apply_boosts() {
        let doctor = |id: &str, boosted: bool| Doctor {
            id: id.to_string(),
            name: id.to_string(),
            specialty: "Cardiology".to_string(),
            location: "Boston".to_string(),
            rating: 4.0,
            boosted,
            available: true,
            bio: None,
        };

        let record = purchase("doc-a", &boost_plan(), None, t0()).unwrap();
        let mut boosts = HashMap::new();
        boosts.insert("doc-a".to_string(), record);

        let doctors = vec![doctor("doc-a", false), doctor("doc-b", true)];

        let now = apply_boosts(doctors.clone(), &boosts, t0() + Duration::days(1));
        assert!(now[0].boosted);
        assert!(now[1].boosted);

        let later = apply_boosts(doctors, &boosts, t0() + Duration::days(8));
        assert!(!later[0].boosted);
    }

    #[test]
    fn test_state_serializes_tagged() {
        let state = EntitlementState::Active { expires_at: t0() };
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["status"], "active");
        assert!(json.get("expiresAt").is_some());
    }
}
