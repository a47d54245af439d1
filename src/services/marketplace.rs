use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::entitlement::{self, EntitlementState};
use crate::core::messaging::{self, Route};
use crate::core::{PlanCatalog, SearchIndex};
use crate::error::MarketplaceError;
use crate::models::{
    ConversationResponse, Doctor, EntitlementKind, EntitlementRecord, EntitlementResponse,
    Message, Plan, SearchParams, SearchQuery, SearchResponse,
};
use crate::services::cache::{CacheKey, CacheStats, SearchCache};
use crate::services::seed::SeedCatalog;
use crate::services::store::{MarketplaceStore, StoreStats};

/// Result-count bounds for search
#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// Application layer over the store, ranking and entitlement rules
///
/// Every time-dependent operation takes `now` explicitly.
pub struct MarketplaceService {
    store: Arc<MarketplaceStore>,
    index: SearchIndex,
    plans: PlanCatalog,
    cache: SearchCache,
    limits: SearchLimits,
}

impl MarketplaceService {
    pub fn new(
        store: Arc<MarketplaceStore>,
        index: SearchIndex,
        plans: PlanCatalog,
        cache: SearchCache,
        limits: SearchLimits,
    ) -> Self {
        Self {
            store,
            index,
            plans,
            cache,
            limits,
        }
    }

    pub fn store(&self) -> &MarketplaceStore {
        &self.store
    }

    /// Load seed doctors into the store. Seed plans are applied by the caller
    /// when building the `PlanCatalog`.
    pub async fn seed(&self, catalog: SeedCatalog) -> Result<usize, MarketplaceError> {
        let count = catalog.doctors.len();
        for doctor in catalog.doctors {
            self.store.upsert_doctor(doctor).await?;
        }
        self.cache.invalidate_all();
        tracing::info!("Seeded {} doctors", count);
        Ok(count)
    }

    pub async fn upsert_doctor(&self, doctor: Doctor) -> Result<(), MarketplaceError> {
        self.store.upsert_doctor(doctor).await?;
        self.cache.invalidate_all();
        Ok(())
    }

    fn build_query(&self, params: SearchParams) -> SearchQuery {
        let limit = params
            .limit
            .unwrap_or(self.limits.default_limit)
            .clamp(1, self.limits.max_limit.max(1));

        SearchQuery {
            text: params.q,
            specialty: params.specialty.filter(|s| !s.trim().is_empty()),
            available_only: params.available_only,
            limit,
        }
    }

    /// Ranked doctor search
    ///
    /// Boost entitlements are resolved at `now` on every call. The cache key
    /// carries the resulting set of granted boosts, so a boost expiring
    /// between two searches misses the cache instead of serving stale
    /// sponsored placement.
    pub async fn search(&self, params: SearchParams, now: DateTime<Utc>) -> SearchResponse {
        let query = self.build_query(params);
        let boosts = self.store.entitlements_of_kind(EntitlementKind::Boost).await;

        let mut granted: Vec<&str> = boosts
            .iter()
            .filter(|(_, record)| entitlement::can_access(Some(record), now))
            .map(|(owner, _)| owner.as_str())
            .collect();
        granted.sort_unstable();
        let key = CacheKey::search(&query, &granted);

        if let Ok(cached) = self.cache.get::<SearchResponse>(&key).await {
            return cached;
        }

        let doctors = self.store.list_doctors().await;
        let doctors = entitlement::apply_boosts(doctors, &boosts, now);
        let result = self.index.search(doctors, &query);

        let response = SearchResponse {
            results: result.results,
            total_candidates: result.total_candidates,
        };

        tracing::debug!(
            "Search {:?} matched {} of {} doctors",
            query.text,
            response.results.len(),
            response.total_candidates
        );

        if let Err(e) = self.cache.set(&key, &response).await {
            tracing::warn!("Failed to cache search results: {}", e);
        }

        response
    }

    /// Single doctor with effective boost flag
    pub async fn doctor(&self, id: &str, now: DateTime<Utc>) -> Result<Doctor, MarketplaceError> {
        let mut doctor = self.store.get_doctor(id).await?;
        if let Some(record) = self.store.get_entitlement(EntitlementKind::Boost, id).await {
            doctor.boosted = entitlement::can_access(Some(&record), now);
        }
        Ok(doctor)
    }

    pub fn plans(&self) -> &[Plan] {
        self.plans.all()
    }

    async fn check_owner(&self, kind: EntitlementKind, owner_id: &str) -> Result<(), MarketplaceError> {
        if owner_id.trim().is_empty() {
            return Err(MarketplaceError::InvalidInput("owner id is empty".to_string()));
        }
        if kind == EntitlementKind::Boost && !self.store.has_doctor(owner_id).await {
            return Err(MarketplaceError::NotFound(format!("doctor {}", owner_id)));
        }
        Ok(())
    }

    fn missing(kind: EntitlementKind, owner_id: &str) -> MarketplaceError {
        MarketplaceError::NotFound(format!("{} for {}", kind, owner_id))
    }

    fn describe(
        kind: EntitlementKind,
        owner_id: &str,
        record: Option<EntitlementRecord>,
        now: DateTime<Utc>,
    ) -> EntitlementResponse {
        let state = EntitlementState::derive(record.as_ref(), now);
        EntitlementResponse {
            owner_id: owner_id.to_string(),
            kind,
            state,
            can_access: state.can_access(now),
            renews_at: state.renews_at(),
            record,
        }
    }

    /// Apply a transition to the stored record and describe the result
    async fn commit<F>(
        &self,
        kind: EntitlementKind,
        owner_id: &str,
        now: DateTime<Utc>,
        transition: F,
    ) -> Result<EntitlementResponse, MarketplaceError>
    where
        F: FnOnce(Option<&EntitlementRecord>) -> Result<EntitlementRecord, MarketplaceError>,
    {
        let record = self.store.update_entitlement(kind, owner_id, transition).await?;

        if kind == EntitlementKind::Boost {
            self.cache.invalidate_all();
        }

        Ok(Self::describe(kind, owner_id, Some(record), now))
    }

    /// Current entitlement of an owner
    pub async fn entitlement(
        &self,
        kind: EntitlementKind,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<EntitlementResponse, MarketplaceError> {
        self.check_owner(kind, owner_id).await?;
        let record = self.store.get_entitlement(kind, owner_id).await;
        Ok(Self::describe(kind, owner_id, record, now))
    }

    pub async fn purchase(
        &self,
        kind: EntitlementKind,
        owner_id: &str,
        plan_id: &str,
        now: DateTime<Utc>,
    ) -> Result<EntitlementResponse, MarketplaceError> {
        self.check_owner(kind, owner_id).await?;
        let plan = self.plans.get(plan_id, kind)?;

        let response = self
            .commit(kind, owner_id, now, |current| {
                entitlement::purchase(owner_id, plan, current, now)
            })
            .await?;
        tracing::info!("{} {} purchased {} until {:?}", kind, owner_id, plan.id, response.renews_at);

        Ok(response)
    }

    pub async fn renew(
        &self,
        kind: EntitlementKind,
        owner_id: &str,
        plan_id: &str,
        now: DateTime<Utc>,
    ) -> Result<EntitlementResponse, MarketplaceError> {
        self.check_owner(kind, owner_id).await?;
        let plan = self.plans.get(plan_id, kind)?;

        let response = self
            .commit(kind, owner_id, now, |current| {
                let current = current.ok_or_else(|| Self::missing(kind, owner_id))?;
                entitlement::renew(current, plan, now)
            })
            .await?;
        tracing::info!("{} {} renewed until {:?}", kind, owner_id, response.renews_at);

        Ok(response)
    }

    pub async fn cancel(
        &self,
        kind: EntitlementKind,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<EntitlementResponse, MarketplaceError> {
        self.check_owner(kind, owner_id).await?;

        let response = self
            .commit(kind, owner_id, now, |current| {
                let current = current.ok_or_else(|| Self::missing(kind, owner_id))?;
                entitlement::cancel(current, now)
            })
            .await?;
        tracing::info!("{} {} cancelled", kind, owner_id);

        Ok(response)
    }

    pub async fn reactivate(
        &self,
        kind: EntitlementKind,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<EntitlementResponse, MarketplaceError> {
        self.check_owner(kind, owner_id).await?;

        let response = self
            .commit(kind, owner_id, now, |current| {
                let current = current.ok_or_else(|| Self::missing(kind, owner_id))?;
                entitlement::reactivate(current, now)
            })
            .await?;
        tracing::info!("{} {} reactivated", kind, owner_id);

        Ok(response)
    }

    /// Send a message if the sender is entitled to
    pub async fn send_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Message, MarketplaceError> {
        if sender_id == recipient_id {
            return Err(MarketplaceError::InvalidInput(
                "cannot send a message to yourself".to_string(),
            ));
        }
        let body = messaging::normalize_body(body)?;

        // Recipients are doctors or users who have written before
        let known = self.store.has_doctor(recipient_id).await
            || self.store.has_sent_any(recipient_id).await;
        if !known {
            return Err(MarketplaceError::NotFound(format!("recipient {}", recipient_id)));
        }

        let route = if self.store.has_doctor(sender_id).await
            && self.store.has_written(recipient_id, sender_id).await
        {
            Route::DoctorReply
        } else {
            Route::Subscribed
        };

        let subscription = self
            .store
            .get_entitlement(EntitlementKind::Subscription, sender_id)
            .await;
        messaging::check_send(route, recipient_id, subscription.as_ref(), now)?;

        let message = messaging::compose(sender_id, recipient_id, body, now);
        self.store.insert_message(message.clone()).await;
        tracing::debug!("Message {} from {} to {}", message.id, sender_id, recipient_id);

        Ok(message)
    }

    /// Conversation between two users in send order
    pub async fn conversation(&self, user_id: &str, peer_id: &str) -> ConversationResponse {
        let messages = self.store.messages_between(user_id, peer_id).await;
        ConversationResponse {
            count: messages.len(),
            messages,
        }
    }

    pub async fn stats(&self) -> (StoreStats, CacheStats) {
        (self.store.stats().await, self.cache.stats())
    }
}
