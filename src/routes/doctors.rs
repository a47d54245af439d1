use actix_web::{web, HttpResponse};

use crate::error::MarketplaceError;
use crate::models::{HealthResponse, SearchParams};
use crate::routes::AppState;

/// Configure search and catalog routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/doctors/search", web::get().to(search_doctors))
        .route("/doctors/{id}", web::get().to(get_doctor))
        .route("/plans", web::get().to(list_plans));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let (store, cache) = state.service.stats().await;

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        store,
        cache,
    })
}

/// Ranked doctor search
///
/// GET /api/v1/doctors/search?q=cardio&specialty=Cardiology&availableOnly=true&limit=20
///
/// Boosted doctors come first, then organic results by relevance.
async fn search_doctors(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> HttpResponse {
    let params = params.into_inner();
    tracing::info!("Searching doctors: q={:?}, specialty={:?}", params.q, params.specialty);

    let response = state.service.search(params, chrono::Utc::now()).await;

    tracing::info!(
        "Returning {} doctors (from {} candidates)",
        response.results.len(),
        response.total_candidates
    );

    HttpResponse::Ok().json(response)
}

/// GET /api/v1/doctors/{id}
async fn get_doctor(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketplaceError> {
    let doctor = state.service.doctor(&path, chrono::Utc::now()).await?;
    Ok(HttpResponse::Ok().json(doctor))
}

/// GET /api/v1/plans
async fn list_plans(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.service.plans())
}
