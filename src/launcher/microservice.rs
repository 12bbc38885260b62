//! Point-to-point microservice mode.

use std::sync::Arc;

use crate::config::{validate_service_config, ServiceConfig};
use crate::descriptor::{MessageRouter, ServiceDescriptor};
use crate::launcher::instance::{Listening, RunningInstance};
use crate::launcher::{LaunchError, Launcher};
use crate::lifecycle::Shutdown;
use crate::observability::{logger, SharedLogger};
use crate::transport::{Dispatcher, TcpTransport};
use crate::validation::ValidationPipe;

impl Launcher {
    /// Start a socket microservice on `tcp.host:tcp.port` serving the
    /// descriptor's message handlers.
    ///
    /// The broker section is not used by this mode.
    pub async fn service(
        descriptor: ServiceDescriptor,
        config: &ServiceConfig,
        logger: Option<SharedLogger>,
    ) -> Result<RunningInstance, LaunchError> {
        let logger = logger::resolve(logger, &config.service_name);
        validate_service_config(config).map_err(LaunchError::InvalidConfig)?;

        if !config.nats.url.is_empty() {
            logger.warn(&format!(
                "broker URL {} is ignored in service mode; listening on the socket transport only",
                config.nats.url
            ));
        }

        let (_, messages, _) = descriptor.into_parts();
        let dispatcher = dispatcher(Arc::new(messages), logger.clone(), "tcp");

        let transport = TcpTransport::bind(&config.tcp, dispatcher).await?;
        let local_addr = transport.local_addr()?;

        let mut instance = RunningInstance::new(&config.service_name, Shutdown::new());
        let stop = instance.shutdown_handle().subscribe();
        instance.attach(Listening::Tcp(local_addr), tokio::spawn(transport.serve(stop)));

        logger.log(&format!("{} service started.", config.service_name));
        Ok(instance)
    }

    /// [`service`](Self::service), with any startup error sent to the logger.
    pub async fn run_service(
        descriptor: ServiceDescriptor,
        config: &ServiceConfig,
        logger: Option<SharedLogger>,
    ) -> Option<RunningInstance> {
        let logger = logger::resolve(logger, &config.service_name);
        let result = Self::service(descriptor, config, Some(logger.clone())).await;
        super::report(result, &logger)
    }
}

/// A dispatcher running the strict validation stage.
pub(crate) fn dispatcher(
    messages: Arc<MessageRouter>,
    logger: SharedLogger,
    transport: &'static str,
) -> Arc<Dispatcher> {
    Arc::new(Dispatcher::new(
        messages,
        Arc::new(ValidationPipe::strict()),
        logger,
        transport,
    ))
}
