//! MedMatch - doctor search ranking and entitlement service
//!
//! Decides in what order doctors appear for a patient's query (sponsored
//! placement first, then relevance) and whether a user may send messages,
//! based on subscription and boost entitlements. The marketplace backend is
//! simulated by an in-memory store.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{EntitlementState, EntitlementStatus, PlanCatalog, RankingPolicy, SearchIndex};
pub use error::MarketplaceError;
pub use models::{Doctor, EntitlementKind, EntitlementRecord, Plan, RankedDoctor, SearchQuery};
pub use services::{MarketplaceService, MarketplaceStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let index = SearchIndex::default();
        let result = index.search(Vec::new(), &SearchQuery::new(""));
        assert!(result.results.is_empty());
        assert_eq!(PlanCatalog::builtin().all().len(), 4);
    }
}
