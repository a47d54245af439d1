use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Doctor profile as listed in search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Doctor {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub specialty: String,
    pub location: String,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f64,
    #[serde(rename = "isBoosted", default)]
    pub boosted: bool,
    #[serde(rename = "isAvailable", default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub bio: Option<String>,
}

fn default_true() -> bool { true }

/// What an entitlement unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitlementKind {
    /// Patient subscription, gates messaging
    Subscription,
    /// Doctor boost, gates sponsored placement
    Boost,
}

impl std::fmt::Display for EntitlementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntitlementKind::Subscription => write!(f, "subscription"),
            EntitlementKind::Boost => write!(f, "boost"),
        }
    }
}

/// Stored entitlement. Never mutated in place; transitions produce a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementRecord {
    pub id: String,
    pub owner_id: String,
    pub kind: EntitlementKind,
    pub plan_id: String,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Purchasable plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub kind: EntitlementKind,
    pub name: String,
    pub duration_days: u32,
    pub price_cents: i64,
}

impl Plan {
    pub fn duration(&self) -> Duration {
        Duration::days(i64::from(self.duration_days))
    }
}

/// A message between a patient and a doctor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Search parameters after request parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub specialty: Option<String>,
    pub available_only: bool,
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            specialty: None,
            available_only: false,
            limit: usize::MAX,
        }
    }

    /// Lowercased whitespace-separated tokens of the free-text part
    pub fn tokens(&self) -> Vec<String> {
        self.text
            .split_whitespace()
            .map(str::to_lowercase)
            .collect()
    }
}

/// Boolean features behind a doctor's placement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingExplanation {
    pub specialty_match: bool,
    pub location_match: bool,
    pub name_match: bool,
    pub available: bool,
    pub highly_rated: bool,
    pub sponsored: bool,
}

/// Ranked search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedDoctor {
    pub doctor: Doctor,
    pub relevance: f64,
    pub explanation: RankingExplanation,
}

/// Relevance weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingWeights {
    pub specialty: f64,
    pub location: f64,
    pub name: f64,
    pub availability: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            specialty: 0.45,
            location: 0.30,
            name: 0.15,
            availability: 0.10,
        }
    }
}

/// Ordering among doctors in the same tier with equal relevance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Higher rating first, then input order
    #[default]
    Rating,
    /// Input order only
    Original,
}
