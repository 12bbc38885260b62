//! Service descriptors.
//!
//! A descriptor is the explicit wiring graph of one service: the HTTP
//! routes (already carrying their own state), the message handlers, and
//! the base API document describing the routes. The launcher mounts and
//! dispatches these; it never looks inside them.

pub mod messages;

use axum::Router;
use utoipa::openapi::{OpenApi, OpenApiBuilder};

pub use messages::{MessageRouter, NO_HANDLER};

/// Everything a launcher needs to know about a service.
#[derive(Clone)]
pub struct ServiceDescriptor {
    routes: Router,
    messages: MessageRouter,
    openapi: OpenApi,
}

impl std::fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("messages", &self.messages)
            .field("paths", &self.openapi.paths.paths.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ServiceDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceDescriptor {
    pub fn new() -> Self {
        Self {
            routes: Router::new(),
            messages: MessageRouter::new(),
            openapi: OpenApiBuilder::new().build(),
        }
    }

    /// Merge HTTP routes. Paths are relative to the prefix the launcher mounts them under.
    pub fn routes(mut self, routes: Router) -> Self {
        self.routes = self.routes.merge(routes);
        self
    }

    pub fn messages(mut self, messages: MessageRouter) -> Self {
        self.messages = messages;
        self
    }

    /// Base API document (paths and schemas). Title, version, server and
    /// security scheme are filled in by the launcher.
    pub fn openapi(mut self, openapi: OpenApi) -> Self {
        self.openapi = openapi;
        self
    }

    pub fn router(&self) -> &Router {
        &self.routes
    }

    pub fn message_router(&self) -> &MessageRouter {
        &self.messages
    }

    pub fn document(&self) -> &OpenApi {
        &self.openapi
    }

    pub(crate) fn into_parts(self) -> (Router, MessageRouter, OpenApi) {
        (self.routes, self.messages, self.openapi)
    }
}
