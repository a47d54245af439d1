use actix_cors::Cors;
use actix_web::{error, middleware, web, App, HttpServer};
use medmatch::config::{LoggingSettings, Settings};
use medmatch::core::{PlanCatalog, RankingPolicy, SearchIndex};
use medmatch::models::ErrorResponse;
use medmatch::routes::{self, AppState};
use medmatch::services::{MarketplaceService, MarketplaceStore, SearchCache, SearchLimits, SeedCatalog};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Handle JSON payload errors
fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    let body = ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    };
    error::InternalError::from_response(err, actix_web::HttpResponse::BadRequest().json(body)).into()
}

/// Handle query payload errors
fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    let body = ErrorResponse {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    };
    error::InternalError::from_response(err, actix_web::HttpResponse::BadRequest().json(body)).into()
}

fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    init_tracing(&settings.logging);
    info!("Starting MedMatch service...");

    // Seed catalog is optional; without it the store starts empty with built-in plans
    let seed = match &settings.catalog.seed_path {
        Some(path) => SeedCatalog::load(path).map_err(|e| {
            error!("Failed to load seed catalog {}: {}", path, e);
            std::io::Error::new(std::io::ErrorKind::InvalidData, e)
        })?,
        None => SeedCatalog::default(),
    };

    let plans = if seed.plans.is_empty() {
        PlanCatalog::builtin()
    } else {
        PlanCatalog::new(seed.plans.clone())
    };
    info!("Plan catalog loaded ({} plans)", plans.all().len());

    let policy = RankingPolicy::new(
        (&settings.search.weights).into(),
        settings.search.tie_break,
        settings.search.highly_rated_threshold,
    );
    info!("Ranking policy initialized: {:?}", policy);

    let cache = SearchCache::new(settings.cache.l1_cache_size, settings.cache.ttl_secs);
    info!(
        "Search cache initialized (L1: {} entries, TTL: {}s)",
        settings.cache.l1_cache_size, settings.cache.ttl_secs
    );

    let limits = SearchLimits {
        default_limit: settings.search.default_limit,
        max_limit: settings.search.max_limit,
    };

    let service = Arc::new(MarketplaceService::new(
        Arc::new(MarketplaceStore::new()),
        SearchIndex::new(policy),
        plans,
        cache,
        limits,
    ));

    service.seed(seed).await.map_err(|e| {
        error!("Failed to seed store: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    })?;

    let app_state = AppState { service };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
