use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::MarketplaceError;
use crate::models::{EntitlementKind, PurchaseRequest, RenewRequest};
use crate::routes::AppState;

/// Configure subscription and boost routes
///
/// Both share one set of handlers; the scope carries the entitlement kind.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(entitlement_scope("/subscriptions", EntitlementKind::Subscription))
        .service(entitlement_scope("/boosts", EntitlementKind::Boost));
}

fn entitlement_scope(path: &str, kind: EntitlementKind) -> actix_web::Scope {
    web::scope(path)
        .app_data(web::Data::new(kind))
        .route("", web::post().to(purchase))
        .route("/{owner_id}", web::get().to(get_status))
        .route("/{owner_id}/renew", web::post().to(renew))
        .route("/{owner_id}/cancel", web::post().to(cancel))
        .route("/{owner_id}/reactivate", web::post().to(reactivate))
}

/// Purchase a plan
///
/// POST /api/v1/subscriptions | /api/v1/boosts
///
/// Request body:
/// ```json
/// {
///   "ownerId": "string",
///   "planId": "patient-monthly"
/// }
/// ```
async fn purchase(
    state: web::Data<AppState>,
    kind: web::Data<EntitlementKind>,
    req: web::Json<PurchaseRequest>,
) -> Result<HttpResponse, MarketplaceError> {
    req.validate()?;
    let kind = *kind.get_ref();

    let response = state
        .service
        .purchase(kind, &req.owner_id, &req.plan_id, chrono::Utc::now())
        .await?;

    Ok(HttpResponse::Created().json(response))
}

/// GET /api/v1/{subscriptions|boosts}/{owner_id}
async fn get_status(
    state: web::Data<AppState>,
    kind: web::Data<EntitlementKind>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketplaceError> {
    let response = state
        .service
        .entitlement(*kind.get_ref(), &path, chrono::Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/{subscriptions|boosts}/{owner_id}/renew
async fn renew(
    state: web::Data<AppState>,
    kind: web::Data<EntitlementKind>,
    path: web::Path<String>,
    req: web::Json<RenewRequest>,
) -> Result<HttpResponse, MarketplaceError> {
    req.validate()?;

    let response = state
        .service
        .renew(*kind.get_ref(), &path, &req.plan_id, chrono::Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/{subscriptions|boosts}/{owner_id}/cancel
///
/// Access is kept until the current period ends.
async fn cancel(
    state: web::Data<AppState>,
    kind: web::Data<EntitlementKind>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketplaceError> {
    let response = state
        .service
        .cancel(*kind.get_ref(), &path, chrono::Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/v1/{subscriptions|boosts}/{owner_id}/reactivate
async fn reactivate(
    state: web::Data<AppState>,
    kind: web::Data<EntitlementKind>,
    path: web::Path<String>,
) -> Result<HttpResponse, MarketplaceError> {
    let response = state
        .service
        .reactivate(*kind.get_ref(), &path, chrono::Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(response))
}
