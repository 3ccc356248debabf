pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pages Deployer API",
        version = "0.1.0",
        description = "Accepts generation jobs and publishes the result to GitHub Pages"
    ),
    paths(routes::root, routes::health_check, routes::submit_job),
    components(schemas(
        routes::HealthResponse,
        routes::RootResponse,
        routes::JobSubmission,
        routes::AcceptedResponse,
        deploy_core::Job,
        deploy_core::Attachment,
        deploy_core::NotificationPayload,
    )),
    tags(
        (name = "health", description = "Liveness endpoints"),
        (name = "jobs", description = "Job submission"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/", get(routes::root))
        .route("/health", get(routes::health_check))
        .route("/api-endpoint", post(routes::submit_job))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
