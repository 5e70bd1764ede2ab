use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use std::sync::Arc;
use tokio::sync::RwLock;
use validator::Validate;
use crate::core::{MatchingError, MatchingPipeline};
use crate::models::{ErrorResponse, HealthResponse, MatchingConfig, RunMatchingRequest, ScorePairRequest};
use crate::services::ParticipantSource;

/// Application state shared across all handlers
pub struct AppState<S> {
    pub pipeline: Arc<RwLock<MatchingPipeline<S>>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl<S> AppState<S> {
    pub fn new(pipeline: MatchingPipeline<S>) -> Self {
        Self {
            pipeline: Arc::new(RwLock::new(pipeline)),
        }
    }
}

/// Configure all matching routes
pub fn configure<S: ParticipantSource + 'static>(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matching/run", web::post().to(run_matching::<S>))
        .route("/matching/score", web::post().to(score_pair::<S>))
        .route("/matching/config", web::get().to(get_config::<S>))
        .route("/matching/config", web::put().to(update_config::<S>));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Run matching endpoint
///
/// POST /api/v1/matching/run
///
/// Request body (optional):
/// ```json
/// {
///   "config": { "frqWeight": 0.7, "quantWeight": 0.3 }
/// }
/// ```
async fn run_matching<S: ParticipantSource + 'static>(
    state: web::Data<AppState<S>>,
    body: web::Bytes,
) -> impl Responder {
    let config = match parse_run_request(&body) {
        Ok(req) => req.config,
        Err(e) => {
            tracing::info!("Rejected run request body: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "invalid_json".to_string(),
                message: format!("Invalid JSON: {}", e),
                status_code: 400,
            });
        }
    };

    tracing::info!("Running matching (config override: {})", config.is_some());

    let pipeline = state.pipeline.read().await;
    match pipeline.run_matching(config).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => error_response(&e),
    }
}

/// Score a single pair endpoint
///
/// POST /api/v1/matching/score
///
/// Request body:
/// ```json
/// {
///   "leftId": "string",
///   "rightId": "string",
///   "config": { "frqWeight": 0.7, "quantWeight": 0.3 }
/// }
/// ```
async fn score_pair<S: ParticipantSource + 'static>(
    state: web::Data<AppState<S>>,
    req: web::Json<ScorePairRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for score request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let req = req.into_inner();
    let pipeline = state.pipeline.read().await;
    match pipeline
        .compute_match_score(&req.left_id, &req.right_id, req.config)
        .await
    {
        Ok(score) => HttpResponse::Ok().json(score),
        Err(e) => error_response(&e),
    }
}

/// Current matching config
///
/// GET /api/v1/matching/config
async fn get_config<S: ParticipantSource + 'static>(
    state: web::Data<AppState<S>>,
) -> impl Responder {
    let pipeline = state.pipeline.read().await;
    HttpResponse::Ok().json(pipeline.config())
}

/// Replace the matching config used by later runs
///
/// PUT /api/v1/matching/config
async fn update_config<S: ParticipantSource + 'static>(
    state: web::Data<AppState<S>>,
    req: web::Json<MatchingConfig>,
) -> impl Responder {
    let mut pipeline = state.pipeline.write().await;
    match pipeline.update_config(req.into_inner()) {
        Ok(()) => HttpResponse::Ok().json(pipeline.config()),
        Err(e) => error_response(&e),
    }
}

/// An empty body means "no override"; anything else must parse
fn parse_run_request(body: &[u8]) -> Result<RunMatchingRequest, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RunMatchingRequest::default());
    }
    serde_json::from_slice(body)
}

fn status_for(err: &MatchingError) -> StatusCode {
    match err {
        MatchingError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        MatchingError::ParticipantNotFound(_) => StatusCode::NOT_FOUND,
        MatchingError::NoParticipants { .. }
        | MatchingError::InconsistentDimensions { .. }
        | MatchingError::NoScoresComputed { .. }
        | MatchingError::Similarity(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MatchingError::Source(_) => StatusCode::BAD_GATEWAY,
    }
}

fn error_code(err: &MatchingError) -> &'static str {
    match err {
        MatchingError::InvalidConfig(_) => "invalid_config",
        MatchingError::NoParticipants { .. } => "no_participants",
        MatchingError::InconsistentDimensions { .. } => "inconsistent_dimensions",
        MatchingError::NoScoresComputed { .. } => "no_scores_computed",
        MatchingError::ParticipantNotFound(_) => "participant_not_found",
        MatchingError::Similarity(_) => "scoring_failed",
        MatchingError::Source(_) => "source_unavailable",
    }
}

fn error_response(err: &MatchingError) -> HttpResponse {
    let status = status_for(err);
    if status.is_server_error() {
        tracing::error!("Matching request failed: {}", err);
    } else {
        tracing::info!("Matching request rejected: {}", err);
    }

    HttpResponse::build(status).json(ErrorResponse {
        error: error_code(err).to_string(),
        message: err.to_string(),
        status_code: status.as_u16(),
    })
}
