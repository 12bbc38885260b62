//! Logger sink used by the launcher and transports.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

/// Destination for launcher lifecycle messages and startup failures.
///
/// Implementations must be cheap to call from any task.
pub trait Logger: Send + Sync + 'static {
    /// Informational message (e.g., "NotificationService app started.").
    fn log(&self, message: &str);

    /// Recoverable oddity worth an operator's attention.
    fn warn(&self, message: &str);

    /// Failure. Startup errors arrive here verbatim.
    fn error(&self, message: &str);
}

pub type SharedLogger = Arc<dyn Logger>;

/// Default sink: forwards to `tracing`, tagged with a context string.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    context: String,
}

impl TracingLogger {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
        }
    }

    pub fn shared(context: impl Into<String>) -> SharedLogger {
        Arc::new(Self::new(context))
    }
}

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::info!(context = %self.context, "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(context = %self.context, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(context = %self.context, "{}", message);
    }
}

/// The supplied logger, or a tracing logger named after the service.
pub fn resolve(logger: Option<SharedLogger>, service_name: &str) -> SharedLogger {
    logger.unwrap_or_else(|| TracingLogger::shared(service_name))
}

/// The instance logger, resolved from request extensions.
///
/// Falls back to a plain tracing logger when the route runs outside a launcher.
#[derive(Clone)]
pub struct RequestLogger(pub SharedLogger);

impl<S> FromRequestParts<S> for RequestLogger
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let logger = parts
            .extensions
            .get::<SharedLogger>()
            .cloned()
            .unwrap_or_else(|| TracingLogger::shared("http"));
        Ok(Self(logger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Lines(Mutex<Vec<String>>);

    impl Logger for Lines {
        fn log(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
        fn warn(&self, _: &str) {}
        fn error(&self, _: &str) {}
    }

    #[test]
    fn test_resolve_keeps_supplied_logger() {
        let lines = Arc::new(Lines::default());
        let logger = resolve(Some(lines.clone()), "Svc");
        logger.log("hello");
        assert_eq!(*lines.0.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_request_logger_fallback() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let RequestLogger(logger) = RequestLogger::from_request_parts(&mut parts, &()).await.unwrap();
        logger.log("no launcher");

        let lines: SharedLogger = Arc::new(Lines::default());
        parts.extensions.insert(lines);
        assert!(RequestLogger::from_request_parts(&mut parts, &()).await.is_ok());
    }
}
