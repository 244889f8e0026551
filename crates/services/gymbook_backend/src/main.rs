use axum::{routing::get, Router};
use gymbook_booking::catalog::apply_catalog;
use gymbook_booking::routes as booking_routes;
use gymbook_common::{log_result, logging, Context, GymbookError};
use gymbook_config::load_config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

mod store_factory;

#[tokio::main]
async fn main() -> Result<(), GymbookError> {
    let config = Arc::new(load_config().context("Failed to load config")?);
    let _log_guard = logging::init_with_config(&config.logging);

    let store = store_factory::create_booking_store(&config).await?;
    log_result(
        apply_catalog(store.as_ref(), &config.catalog).await,
        "Catalog loaded",
        "Failed to apply catalog",
    )
    .context("Invalid catalog configuration")?;

    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Gymbook API!" }))
        .merge(booking_routes(config.clone(), store));

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use gymbook_booking::doc::BookingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Gymbook API",
                version = "0.1.0",
                description = "Trainer availability and appointment booking",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");

        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc);
        app = app.merge(swagger_ui);
    }

    let app = app
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
