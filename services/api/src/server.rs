use crate::cli::ServeArgs;
use crate::infra::{build_pool_service, AppState};
use crate::routes::with_pool_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use division_pool::config::AppConfig;
use division_pool::error::AppError;
use division_pool::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    args.storage.apply(&mut config.pool);

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        photo_dir: Arc::new(config.pool.photo_dir.clone()),
    };

    let pool_service = Arc::new(build_pool_service(&config.pool)?);
    let summary = pool_service.bootstrap()?;

    let app = with_pool_routes(pool_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        storage = config.pool.storage.label(),
        people = summary.people,
        predictors = summary.predictors,
        choices = summary.choices,
        "division pool ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
