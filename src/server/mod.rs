//! HTTP API for the document lifecycle.
//!
//! Handlers are thin: they validate the request body, hand the work to the
//! repositories on the blocking pool and wrap the result in the JSON
//! envelope from [`response`].

pub mod handlers;
pub mod response;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

use crate::config::Settings;
use crate::repository::{DocumentRepository, ImageRepository, StorageLayout};
use crate::services::{PublishService, SiteRebuilder};

/// Shared state for request handlers. Cloning is cheap; nothing here holds
/// document state, the file system does.
#[derive(Clone)]
pub struct AppState {
    pub documents: DocumentRepository,
    pub images: ImageRepository,
    pub publisher: PublishService,
    pub rebuilder: SiteRebuilder,
    pub rebuild_on_publish: bool,
    pub layout: StorageLayout,
}

impl AppState {
    pub fn new(layout: StorageLayout, rebuilder: SiteRebuilder, rebuild_on_publish: bool) -> Self {
        let documents = DocumentRepository::new(layout.clone());
        let images = ImageRepository::new(layout.clone());
        Self {
            publisher: PublishService::new(documents.clone(), images.clone()),
            documents,
            images,
            rebuilder,
            rebuild_on_publish,
            layout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.layout(),
            SiteRebuilder::new(settings.rebuild_url.clone(), settings.rebuild_timeout()),
            settings.rebuild_on_publish,
        )
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);
    let static_images = ServeDir::new(state.layout.static_images_dir());

    Router::new()
        .route("/api/health", get(handlers::site::health))
        .route("/api/documents", get(handlers::documents::list_documents))
        .route(
            "/api/documents/:id",
            get(handlers::documents::get_document).delete(handlers::documents::delete_document),
        )
        .route("/api/documents/import", post(handlers::documents::import_document))
        .route("/api/documents/save", post(handlers::documents::save_document))
        .route("/api/documents/process", post(handlers::documents::process_document))
        .route("/api/documents/publish", post(handlers::documents::publish_document))
        .route(
            "/api/images",
            get(handlers::images::list_images).post(handlers::images::upload_image),
        )
        .route("/api/images/:id", get(handlers::images::get_image))
        .route("/api/site/rebuild", post(handlers::site::rebuild))
        .nest_service("/images", static_images)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Prepare storage and serve until the process is stopped.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let report = settings.prepare_storage()?;
    if !report.is_clean() {
        info!(
            "Recovered storage: {} duplicates, {} orphans",
            report.duplicates_resolved.len(),
            report.orphans_removed.len()
        );
    }

    let state = AppState::from_settings(settings);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr()).await?;
    info!(
        "Serving {} on http://{}",
        settings.project_root.display(),
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;
    Ok(())
}
