//! HTTP plus broker mode.

use std::sync::Arc;

use crate::config::{validate_app_config, AppConfig};
use crate::descriptor::ServiceDescriptor;
use crate::launcher::application::start_http;
use crate::launcher::instance::{Listening, RunningInstance};
use crate::launcher::microservice::dispatcher;
use crate::launcher::{LaunchError, Launcher};
use crate::lifecycle::Shutdown;
use crate::observability::{logger, SharedLogger};
use crate::transport::NatsTransport;

impl Launcher {
    /// Start the HTTP application, then subscribe to the broker for every
    /// message pattern. If the broker step fails the HTTP side is stopped
    /// before the error is returned.
    ///
    /// A descriptor without message handlers is refused before anything binds.
    pub async fn hybrid(
        descriptor: ServiceDescriptor,
        config: &AppConfig,
        logger: Option<SharedLogger>,
    ) -> Result<RunningInstance, LaunchError> {
        let logger = logger::resolve(logger, &config.service_name);
        validate_app_config(config).map_err(LaunchError::InvalidConfig)?;

        let (routes, messages, document) = descriptor.into_parts();
        if messages.is_empty() {
            return Err(LaunchError::NoMessageHandlers);
        }
        let mut instance = RunningInstance::new(&config.service_name, Shutdown::new());
        start_http(&mut instance, routes, document, config, logger.clone()).await?;
        logger.log(&format!("{} app started.", config.service_name));

        let dispatcher = dispatcher(Arc::new(messages), logger.clone(), "broker");
        let transport = match NatsTransport::connect(&config.nats, dispatcher).await {
            Ok(transport) => transport,
            Err(e) => {
                instance.shutdown().await;
                return Err(e.into());
            }
        };

        let listening = Listening::Broker {
            url: config.nats.url.clone(),
            subjects: transport.subjects().to_vec(),
        };
        let stop = instance.shutdown_handle().subscribe();
        instance.attach(listening, tokio::spawn(transport.serve(stop)));

        logger.log(&format!("{} service started.", config.service_name));
        Ok(instance)
    }

    /// [`hybrid`](Self::hybrid), with any startup error sent to the logger.
    pub async fn run_hybrid(
        descriptor: ServiceDescriptor,
        config: &AppConfig,
        logger: Option<SharedLogger>,
    ) -> Option<RunningInstance> {
        let logger = logger::resolve(logger, &config.service_name);
        let result = Self::hybrid(descriptor, config, Some(logger.clone())).await;
        super::report(result, &logger)
    }
}
