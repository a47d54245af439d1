// Core algorithm exports
pub mod entitlement;
pub mod messaging;
pub mod plans;
pub mod ranking;
pub mod search;

pub use entitlement::{EntitlementState, EntitlementStatus};
pub use plans::PlanCatalog;
pub use ranking::RankingPolicy;
pub use search::{SearchIndex, SearchResult};
