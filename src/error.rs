use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::{EntitlementKind, ErrorResponse};

/// Rejected results from the marketplace core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketplaceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid plan id: {0}")]
    InvalidPlan(String),

    #[error("Cannot {action} {kind} in state {state}")]
    InvalidTransition {
        kind: EntitlementKind,
        action: &'static str,
        state: &'static str,
    },

    #[error("Active subscription required to message {0}")]
    EntitlementRequired(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl MarketplaceError {
    fn code(&self) -> &'static str {
        match self {
            MarketplaceError::NotFound(_) => "not_found",
            MarketplaceError::InvalidPlan(_) => "invalid_plan",
            MarketplaceError::InvalidTransition { .. } => "invalid_transition",
            MarketplaceError::EntitlementRequired(_) => "entitlement_required",
            MarketplaceError::InvalidInput(_) => "invalid_input",
        }
    }
}

impl From<validator::ValidationErrors> for MarketplaceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        MarketplaceError::InvalidInput(errors.to_string())
    }
}

impl ResponseError for MarketplaceError {
    fn status_code(&self) -> StatusCode {
        match self {
            MarketplaceError::NotFound(_) => StatusCode::NOT_FOUND,
            MarketplaceError::InvalidPlan(_) | MarketplaceError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            MarketplaceError::InvalidTransition { .. } => StatusCode::CONFLICT,
            MarketplaceError::EntitlementRequired(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}
