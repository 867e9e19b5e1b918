mod api;

use std::env;
use std::sync::Arc;

use axum::extract::MatchedPath;
use axum::http::Request;
use axum::Router;
use fridgechef_core::image::DashscopeImageApi;
use fridgechef_core::llm::create_provider_from_env;
use fridgechef_core::{ImageTaskStore, ImageWorker, RecipeGenerator, RecipeWorkflow};
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across all handlers
pub struct AppContext {
    pub workflow: RecipeWorkflow,
    pub tasks: Arc<ImageTaskStore>,
}

pub type AppState = Arc<AppContext>;

fn init_telemetry() {
    let fmt_layer = tracing_subscriber::fmt::layer();
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn build_state() -> AppState {
    let provider = create_provider_from_env().expect("Failed to configure LLM provider");
    let generator = RecipeGenerator::new(Arc::from(provider));

    let image_api = DashscopeImageApi::from_env().expect("Failed to configure image API");
    let tasks = Arc::new(ImageTaskStore::new());
    let worker = ImageWorker::new(Arc::new(image_api), tasks.clone());

    Arc::new(AppContext {
        workflow: RecipeWorkflow::new(generator, worker),
        tasks,
    })
}

#[tokio::main]
async fn main() {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        let spec = api::openapi().to_pretty_json().unwrap();
        println!("{}", spec);
        return;
    }

    init_telemetry();

    let state = build_state();

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    let app = Router::new()
        .nest("/api/recipes", api::recipes::router())
        .nest("/api/images", api::images::router())
        .with_state(state)
        .merge(swagger_ui)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &Span| {
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                ),
        );

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8081);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .unwrap();

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        port
    );

    axum::serve(listener, app).await.unwrap();
}
