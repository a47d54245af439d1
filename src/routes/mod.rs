// Route exports
pub mod doctors;
pub mod entitlements;
pub mod messages;

use actix_web::web;
use std::sync::Arc;

use crate::services::MarketplaceService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MarketplaceService>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(doctors::configure)
            .configure(entitlements::configure)
            .configure(messages::configure),
    );
}
