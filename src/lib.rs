pub mod api;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::UploadConfig;
use crate::services::sniffer::ContentSniffer;
use crate::services::storage::StorageService;
use crate::services::upload_service::UploadService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Extra room on top of `max_upload_size` for multipart framing
pub const MULTIPART_OVERHEAD: usize = 10 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::index::index,
        api::handlers::upload::upload_file,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            models::UploadReport,
            models::ErrorResponse,
            api::handlers::upload::UploadForm,
            api::handlers::health::HealthResponse,
        )
    ),
    tags(
        (name = "upload", description = "MIME classification of uploaded files"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageService>,
    pub upload_service: Arc<UploadService>,
    pub config: UploadConfig,
}

impl AppState {
    pub fn new(
        config: UploadConfig,
        storage: Arc<dyn StorageService>,
        sniffer: Arc<dyn ContentSniffer>,
    ) -> Self {
        let upload_service = Arc::new(UploadService::new(storage.clone(), sniffer));
        Self {
            storage,
            upload_service,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::index::index))
        .route("/health", get(api::handlers::health::health_check))
        .route("/upload", post(api::handlers::upload::upload_file))
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_size + MULTIPART_OVERHEAD,
        ))
        .with_state(state)
}
