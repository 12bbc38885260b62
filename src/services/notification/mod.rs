//! Notification service.
//!
//! # Data Flow
//! ```text
//! HTTP  /notifications…  → handlers.rs (Valid / ValidQuery) ─┐
//!                                                          ├→ store.rs (DashMap)
//! TCP / NATS  notification.* → handlers::messages ──────────┘
//! ```
//!
//! # Design Decisions
//! - One store shared by both surfaces, so a notification sent over one is
//!   visible over the other
//! - The database section of the config is carried but not opened; the store
//!   is in memory

pub mod config;
pub mod handlers;
pub mod model;
pub mod store;

use std::sync::Arc;

use utoipa::OpenApi;

use crate::descriptor::ServiceDescriptor;

pub use handlers::{patterns, NotificationError};
pub use model::{Channel, Notification, NotificationStatus, SendNotification};
pub use store::NotificationStore;

/// Name this service is selected by at process entry.
pub const SERVICE_ID: &str = "notification-service";

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::send_notification,
        handlers::list_notifications,
        handlers::find_notification,
        handlers::mark_read,
        handlers::health,
    ),
    components(schemas(
        model::SendNotification,
        model::FindNotification,
        model::Notification,
        model::Channel,
        model::NotificationStatus,
        model::HealthResponse,
    )),
    tags(
        (name = "notifications", description = "Send and track notifications"),
        (name = "health", description = "Health check operations")
    )
)]
pub struct NotificationApi;

/// Wire the service for the launcher.
pub fn descriptor(store: Arc<NotificationStore>) -> ServiceDescriptor {
    ServiceDescriptor::new()
        .routes(handlers::routes(store.clone()))
        .messages(handlers::messages(store))
        .openapi(NotificationApi::openapi())
}
