// Service exports
pub mod cache;
pub mod marketplace;
pub mod seed;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheStats, SearchCache};
pub use marketplace::{MarketplaceService, SearchLimits};
pub use seed::{CatalogError, SeedCatalog};
pub use store::{MarketplaceStore, StoreStats};
