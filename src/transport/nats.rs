//! Publish/subscribe transport over a NATS broker.
//!
//! Every registered pattern is a subject. Message payloads are request
//! envelopes; replies go to the message's reply subject.

use std::sync::Arc;

use async_nats::{Client, ConnectOptions, Message, Subscriber};
use futures_util::stream::{self, StreamExt};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::NatsConfig;
use crate::transport::dispatch::Dispatcher;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Failed to connect to broker at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: async_nats::ConnectError,
    },

    #[error("Failed to subscribe to '{subject}': {source}")]
    Subscribe {
        subject: String,
        #[source]
        source: async_nats::SubscribeError,
    },
}

/// Broker listener, connected and subscribed.
pub struct NatsTransport {
    client: Client,
    subscribers: Vec<Subscriber>,
    subjects: Vec<String>,
    dispatcher: Arc<Dispatcher>,
}

impl NatsTransport {
    /// Connect to `config.url` and subscribe to every pattern the dispatcher knows.
    pub async fn connect(config: &NatsConfig, dispatcher: Arc<Dispatcher>) -> Result<Self, BrokerError> {
        let mut options = ConnectOptions::new();
        if let Some(name) = &config.name {
            options = options.name(name);
        }

        let client = options
            .connect(config.url.as_str())
            .await
            .map_err(|source| BrokerError::Connect {
                url: config.url.clone(),
                source,
            })?;

        let subjects = dispatcher.router().patterns();
        let mut subscribers = Vec::with_capacity(subjects.len());
        for subject in &subjects {
            let subscribed = match &config.queue {
                Some(queue) => client.queue_subscribe(subject.clone(), queue.clone()).await,
                None => client.subscribe(subject.clone()).await,
            };
            let subscriber = subscribed.map_err(|source| BrokerError::Subscribe {
                subject: subject.clone(),
                source,
            })?;
            subscribers.push(subscriber);
        }

        tracing::info!(
            url = %config.url,
            subjects = subjects.len(),
            queue = config.queue.as_deref().unwrap_or("-"),
            "Broker subscriptions ready"
        );

        Ok(Self {
            client,
            subscribers,
            subjects,
            dispatcher,
        })
    }

    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Handle messages until `shutdown` fires.
    pub async fn serve(self, mut shutdown: broadcast::Receiver<()>) {
        let Self {
            client,
            subscribers,
            dispatcher,
            ..
        } = self;
        let mut messages = stream::select_all(subscribers);

        loop {
            tokio::select! {
                message = messages.next() => match message {
                    Some(message) => {
                        let client = client.clone();
                        let dispatcher = dispatcher.clone();
                        tokio::spawn(async move {
                            handle_message(&client, &dispatcher, message).await;
                        });
                    }
                    None => {
                        dispatcher.logger().warn("broker subscriptions closed");
                        break;
                    }
                },
                _ = shutdown.recv() => break,
            }
        }

        drop(messages);
        if let Err(e) = client.flush().await {
            tracing::debug!(error = %e, "Broker flush failed");
        }
        tracing::info!("Broker transport stopped");
    }
}

async fn handle_message(client: &Client, dispatcher: &Dispatcher, message: Message) {
    let Some(reply) = dispatcher.handle_bytes(&message.payload).await else {
        return;
    };

    match message.reply {
        Some(subject) => {
            if let Err(e) = client.publish(subject, reply.into()).await {
                dispatcher
                    .logger()
                    .error(&format!("failed to publish reply on '{}': {}", message.subject, e));
            }
        }
        None => tracing::debug!(subject = %message.subject, "Request without reply subject"),
    }
}
