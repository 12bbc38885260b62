//! Message pattern routing.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::validation::{RpcException, ValidationPipe};

pub const NO_HANDLER: &str = "There is no matching message handler defined in the remote service.";

type HandlerFn =
    dyn Fn(Arc<ValidationPipe>, Value) -> BoxFuture<'static, Result<Value, RpcException>> + Send + Sync;

/// Maps message patterns to typed handlers.
///
/// Each handler decodes its payload through the validation pipe of the
/// transport that received the message.
#[derive(Clone, Default)]
pub struct MessageRouter {
    handlers: BTreeMap<String, Arc<HandlerFn>>,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `pattern`. A later registration replaces an earlier one.
    pub fn on<T, R, F, Fut>(mut self, pattern: impl Into<String>, handler: F) -> Self
    where
        T: DeserializeOwned + Validate + Send + 'static,
        R: Serialize + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, RpcException>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: Arc<HandlerFn> = Arc::new(move |pipe: Arc<ValidationPipe>, data: Value| {
            let handler = handler.clone();
            Box::pin(async move {
                let payload = pipe.transform::<T>(data)?;
                let reply = handler(payload).await?;
                serde_json::to_value(reply).map_err(RpcException::internal)
            }) as BoxFuture<'static, Result<Value, RpcException>>
        });
        self.handlers.insert(pattern.into(), erased);
        self
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.handlers.contains_key(pattern)
    }

    /// Registered patterns, sorted.
    pub fn patterns(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the handler for `pattern` on `data`.
    pub async fn dispatch(
        &self,
        pipe: Arc<ValidationPipe>,
        pattern: &str,
        data: Value,
    ) -> Result<Value, RpcException> {
        let handler = self
            .handlers
            .get(pattern)
            .cloned()
            .ok_or_else(|| RpcException::new(NO_HANDLER))?;
        handler(pipe, data).await
    }
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("patterns", &self.patterns())
            .finish()
    }
}
