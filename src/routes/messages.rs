use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::MarketplaceError;
use crate::models::{ConversationParams, SendMessageRequest};
use crate::routes::AppState;

/// Configure messaging routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/messages", web::post().to(send_message))
        .route("/messages", web::get().to(get_conversation));
}

/// Send a message
///
/// POST /api/v1/messages
///
/// Request body:
/// ```json
/// {
///   "senderId": "string",
///   "recipientId": "string",
///   "body": "string"
/// }
/// ```
///
/// Rejected with 403 unless the sender holds a subscription with access,
/// or is a doctor replying to a patient.
async fn send_message(
    state: web::Data<AppState>,
    req: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, MarketplaceError> {
    req.validate()?;

    let message = state
        .service
        .send_message(&req.sender_id, &req.recipient_id, &req.body, chrono::Utc::now())
        .await?;

    Ok(HttpResponse::Created().json(message))
}

/// GET /api/v1/messages?userId={userId}&peerId={peerId}
async fn get_conversation(
    state: web::Data<AppState>,
    query: web::Query<ConversationParams>,
) -> HttpResponse {
    let response = state
        .service
        .conversation(&query.user_id, &query.peer_id)
        .await;

    HttpResponse::Ok().json(response)
}
