//! HTTP routes and message handlers for notifications.

use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use thiserror::Error;
use uuid::Uuid;

use super::model::{
    FindNotification, HealthResponse, ListNotifications, Notification, SendNotification,
};
use super::store::NotificationStore;
use super::SERVICE_ID;
use crate::descriptor::MessageRouter;
use crate::observability::RequestLogger;
use crate::validation::{FieldError, RpcException, Valid, ValidQuery};

/// Message patterns.
pub mod patterns {
    pub const SEND: &str = "notification.send";
    pub const LIST: &str = "notification.list";
    pub const FIND: &str = "notification.find";
    pub const MARK_READ: &str = "notification.mark_read";
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Invalid(#[from] RpcException),
}

impl IntoResponse for NotificationError {
    fn into_response(self) -> Response {
        match self {
            NotificationError::NotFound(_) => {
                let body = RpcException::new(self.to_string()).to_value();
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
            NotificationError::Invalid(e) => e.into_response(),
        }
    }
}

impl From<NotificationError> for RpcException {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Invalid(e) => e,
            other => RpcException::new(other.to_string()),
        }
    }
}

type Store = State<Arc<NotificationStore>>;

fn notification_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, NotificationError> {
    path.map(|Path(id)| id).map_err(|_| {
        NotificationError::Invalid(RpcException::validation(vec![FieldError::constraint(
            "id",
            "isUuid",
            "id must be a UUID",
        )]))
    })
}

#[utoipa::path(
    post,
    path = "/notifications",
    tag = "notifications",
    request_body = SendNotification,
    responses(
        (status = 201, description = "Notification sent", body = Notification),
        (status = 400, description = "Validation failed")
    ),
    security(("header" = []))
)]
pub async fn send_notification(
    State(store): Store,
    RequestLogger(logger): RequestLogger,
    Valid(request): Valid<SendNotification>,
) -> (StatusCode, Json<Notification>) {
    let notification = store.insert(request);
    logger.log(&format!(
        "notification {} sent via {:?}",
        notification.id, notification.channel
    ));
    (StatusCode::CREATED, Json(notification))
}

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    params(ListNotifications),
    responses(
        (status = 200, description = "Notifications, newest first", body = [Notification]),
        (status = 400, description = "Validation failed")
    ),
    security(("header" = []))
)]
pub async fn list_notifications(
    State(store): Store,
    ValidQuery(query): ValidQuery<ListNotifications>,
) -> Json<Vec<Notification>> {
    Json(store.list(&query))
}

#[utoipa::path(
    get,
    path = "/notifications/{id}",
    tag = "notifications",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "The notification", body = Notification),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Unknown id")
    ),
    security(("header" = []))
)]
pub async fn find_notification(
    State(store): Store,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Notification>, NotificationError> {
    let id = notification_id(path)?;
    store.get(id).map(Json).ok_or(NotificationError::NotFound(id))
}

#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "notifications",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "The updated notification", body = Notification),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Unknown id")
    ),
    security(("header" = []))
)]
pub async fn mark_read(
    State(store): Store,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Notification>, NotificationError> {
    let id = notification_id(path)?;
    store.mark_read(id).map(Json).ok_or(NotificationError::NotFound(id))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health(State(store): Store) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_ID.to_string(),
        notifications: store.len(),
    })
}

pub fn routes(store: Arc<NotificationStore>) -> Router {
    Router::new()
        .route("/notifications", post(send_notification).get(list_notifications))
        .route("/notifications/{id}", get(find_notification))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/health", get(health))
        .with_state(store)
}

pub fn messages(store: Arc<NotificationStore>) -> MessageRouter {
    let send = store.clone();
    let list = store.clone();
    let find = store.clone();
    let read = store;

    MessageRouter::new()
        .on(patterns::SEND, move |request: SendNotification| {
            let store = send.clone();
            async move { Ok::<_, RpcException>(store.insert(request)) }
        })
        .on(patterns::LIST, move |query: ListNotifications| {
            let store = list.clone();
            async move { Ok::<_, RpcException>(store.list(&query)) }
        })
        .on(patterns::FIND, move |request: FindNotification| {
            let store = find.clone();
            async move {
                store
                    .get(request.id)
                    .ok_or_else(|| RpcException::from(NotificationError::NotFound(request.id)))
            }
        })
        .on(patterns::MARK_READ, move |request: FindNotification| {
            let store = read.clone();
            async move {
                store
                    .mark_read(request.id)
                    .ok_or_else(|| RpcException::from(NotificationError::NotFound(request.id)))
            }
        })
}
