//! thread2task - AWS Lambda Runtime

use lambda_http::{run, Error};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use thread2task_app::create_app;
use thread2task_common::config::DEFAULT_RUST_LOG;
use thread2task_workflows::Dispatch;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_RUST_LOG)),
        )
        .json()
        .without_time()
        .init();

    info!("Initializing thread2task Lambda");

    // The environment is frozen after each response, so runs finish first
    let app = create_app(Dispatch::Inline)
        .await
        .map_err(|e| Error::from(format!("App initialization error: {}", e)))?;

    let app = app.layer(TraceLayer::new_for_http());

    info!("thread2task Lambda ready to serve requests");

    run(app).await
}
