//! Transport-independent message handling.

use std::sync::Arc;

use crate::descriptor::MessageRouter;
use crate::observability::metrics::{self, Outcome};
use crate::observability::SharedLogger;
use crate::transport::envelope::{IncomingRequest, OutgoingResponse};
use crate::validation::{RpcException, ValidationPipe};

/// Routes decoded envelopes to handlers and shapes the replies.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<MessageRouter>,
    pipe: Arc<ValidationPipe>,
    logger: SharedLogger,
    transport: &'static str,
}

impl Dispatcher {
    pub fn new(
        router: Arc<MessageRouter>,
        pipe: Arc<ValidationPipe>,
        logger: SharedLogger,
        transport: &'static str,
    ) -> Self {
        Self {
            router,
            pipe,
            logger,
            transport,
        }
    }

    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }

    /// Handle one message. Returns the reply for requests, `None` for events.
    pub async fn handle(&self, request: IncomingRequest) -> Option<OutgoingResponse> {
        let pattern = request.pattern_key();
        let result = self
            .router
            .dispatch(self.pipe.clone(), &pattern, request.data)
            .await;

        let outcome = match &result {
            Ok(_) => Outcome::Ok,
            Err(e) if e.is_validation() => Outcome::Rejected,
            Err(_) if !self.router.contains(&pattern) => Outcome::Unhandled,
            Err(_) => Outcome::Failed,
        };
        metrics::record_message(self.transport, self.pattern_label(&pattern), outcome);
        if outcome == Outcome::Rejected {
            metrics::record_validation_failure(self.transport);
        }

        match request.id {
            Some(id) => Some(match result {
                Ok(value) => OutgoingResponse::success(id, value),
                Err(e) => {
                    tracing::debug!(transport = self.transport, pattern = %pattern, reason = %e, "Request failed");
                    OutgoingResponse::failure(id, &e)
                }
            }),
            None => {
                if let Err(e) = result {
                    self.logger.error(&format!("event '{}' failed: {}", pattern, e));
                }
                None
            }
        }
    }

    /// Metric label for `pattern`. Unregistered patterns come straight off
    /// the wire and share one label.
    fn pattern_label<'p>(&self, pattern: &'p str) -> &'p str {
        if self.router.contains(pattern) {
            pattern
        } else {
            metrics::UNKNOWN_PATTERN
        }
    }

    /// Handle a raw JSON envelope (broker payloads). Malformed input is
    /// logged and dropped since there is no id to reply to.
    pub async fn handle_bytes(&self, payload: &[u8]) -> Option<Vec<u8>> {
        let request: IncomingRequest = match serde_json::from_slice(payload) {
            Ok(request) => request,
            Err(e) => {
                self.logger
                    .warn(&format!("dropping malformed {} message: {}", self.transport, e));
                return None;
            }
        };

        let response = self.handle(request).await?;
        match serde_json::to_vec(&response) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                let fallback = OutgoingResponse::failure(response.id, &RpcException::internal(e));
                serde_json::to_vec(&fallback).ok()
            }
        }
    }
}
