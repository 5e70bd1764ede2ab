use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use cohort_match::config::{LoggingSettings, Settings};
use cohort_match::core::MatchingPipeline;
use cohort_match::routes::{self, matching::AppState};
use cohort_match::services::VectorStoreClient;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings.logging);
    info!("Starting Cohort Match service...");

    let store = &settings.vector_store;
    let mut client = VectorStoreClient::new(
        store.url.clone(),
        store.api_key.clone(),
        store.collection.clone(),
        store.timeout_secs.unwrap_or(30),
        store.page_size.unwrap_or(256),
    )
    .map_err(|e| {
        error!("Failed to create vector store client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    if let Some(name) = &store.vector_name {
        client = client.with_vector_name(name.clone());
    }

    client.connect().await.map_err(|e| {
        error!("Failed to connect to vector store at {}: {}", store.url, e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
    })?;
    let client = Arc::new(client);

    let matching_config = settings.matching.to_matching_config();
    let pipeline = MatchingPipeline::new(Arc::clone(&client), matching_config).map_err(|e| {
        error!("Invalid matching configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("Matching pipeline initialized with config: {:?}", matching_config);

    let app_state = AppState::new(pipeline);

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    let result = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes::<VectorStoreClient>)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await;

    client.close();
    result
}
