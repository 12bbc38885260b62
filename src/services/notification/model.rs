//! Notification payloads and records.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Push,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Sent,
    Read,
}

/// Request to send a notification.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SendNotification {
    /// Address on the chosen channel (email, phone number, device token).
    #[validate(length(min = 1, max = 320))]
    #[schema(example = "ada@example.com")]
    pub recipient: String,

    pub channel: Channel,

    #[validate(length(max = 200))]
    pub subject: Option<String>,

    #[validate(length(min = 1, max = 4000))]
    #[schema(example = "Your order has shipped.")]
    pub body: String,
}

/// Lookup by id.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct FindNotification {
    pub id: Uuid,
}

/// Listing filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListNotifications {
    /// Only notifications for this recipient.
    #[validate(length(min = 1, max = 320))]
    pub recipient: Option<String>,

    /// Maximum number of results, newest first.
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<usize>,
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: String,
    pub channel: Channel,
    pub subject: Option<String>,
    pub body: String,
    pub status: NotificationStatus,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub notifications: usize,
}
