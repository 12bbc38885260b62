//! HTTP application mode.

use std::sync::Arc;

use axum::{Extension, Router};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::openapi::OpenApi;

use crate::config::{validate_app_config, AppConfig};
use crate::descriptor::ServiceDescriptor;
use crate::launcher::docs;
use crate::launcher::instance::{Listening, RunningInstance};
use crate::launcher::{LaunchError, Launcher};
use crate::lifecycle::{shutdown, Shutdown};
use crate::observability::{logger, SharedLogger};
use crate::validation::ValidationPipe;

impl Launcher {
    /// Start an HTTP application: every descriptor route under `config.prefix`,
    /// the API document at the prefix, permissive CORS and the strict
    /// validation stage on every request.
    pub async fn application(
        descriptor: ServiceDescriptor,
        config: &AppConfig,
        logger: Option<SharedLogger>,
    ) -> Result<RunningInstance, LaunchError> {
        let logger = logger::resolve(logger, &config.service_name);
        validate_app_config(config).map_err(LaunchError::InvalidConfig)?;

        let (routes, _, document) = descriptor.into_parts();
        let mut instance = RunningInstance::new(&config.service_name, Shutdown::new());
        start_http(&mut instance, routes, document, config, logger.clone()).await?;

        logger.log(&format!("{} app started.", config.service_name));
        Ok(instance)
    }

    /// [`application`](Self::application), with any startup error sent to the logger.
    pub async fn run_application(
        descriptor: ServiceDescriptor,
        config: &AppConfig,
        logger: Option<SharedLogger>,
    ) -> Option<RunningInstance> {
        let logger = logger::resolve(logger, &config.service_name);
        let result = Self::application(descriptor, config, Some(logger.clone())).await;
        super::report(result, &logger)
    }
}

/// Wrap descriptor routes into the served application.
pub(crate) fn http_app(
    routes: Router,
    document: OpenApi,
    config: &AppConfig,
    pipe: Arc<ValidationPipe>,
    logger: SharedLogger,
) -> Router {
    let prefix = docs::normalize_prefix(&config.prefix);
    let document = docs::build_document(document, &config.service_name, &prefix);

    docs::mount(routes, &prefix, document)
        .layer(Extension(pipe))
        .layer(Extension(logger))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

/// Bind `host:port` and spawn the HTTP server on `instance`.
pub(crate) async fn start_http(
    instance: &mut RunningInstance,
    routes: Router,
    document: OpenApi,
    config: &AppConfig,
    logger: SharedLogger,
) -> Result<(), LaunchError> {
    let pipe = Arc::new(ValidationPipe::strict());
    let app = http_app(routes, document, config, pipe, logger.clone());

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| LaunchError::Bind { addr, source })?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        prefix = %config.prefix,
        "HTTP server starting"
    );

    let stop = instance.shutdown_handle().subscribe();
    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::recv(stop))
            .await
        {
            logger.error(&format!("HTTP server failed: {e}"));
        }
        tracing::info!("HTTP server stopped");
    });

    instance.attach(Listening::Http(local_addr), task);
    Ok(())
}
