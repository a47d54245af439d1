// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Doctor, EntitlementKind, EntitlementRecord, Message, Plan, RankedDoctor, RankingExplanation,
    RankingWeights, SearchQuery, TieBreak,
};
pub use requests::{ConversationParams, PurchaseRequest, RenewRequest, SearchParams, SendMessageRequest};
pub use responses::{ConversationResponse, EntitlementResponse, ErrorResponse, HealthResponse, SearchResponse};
