//! Redis Pub/Sub transport.
//!
//! Unread events go out on per-user channels; note read commands come in on
//! a single command channel.

use async_trait::async_trait;
use fred::clients::{Client, SubscriberClient};
use fred::error::Error as RedisError;
use fred::interfaces::{ClientLike, EventInterface, PubsubInterface};
use fred::types::Message;
use fred::types::config::Config as RedisConfig;
use noteread_common::{AppError, AppResult};
use noteread_core::{EventPublisher, NoteReadEvent};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Channel carrying a user's main stream events.
fn main_stream_channel(prefix: &str, user_id: &str) -> String {
    format!("{prefix}:mainStream:{user_id}")
}

/// Channel carrying a user's push notifications.
fn push_channel(prefix: &str, user_id: &str) -> String {
    format!("{prefix}:push:{user_id}")
}

fn envelope(event: &NoteReadEvent, body: Value) -> String {
    json!({ "type": event.name(), "body": body }).to_string()
}

/// Publishes unread pipeline events over Redis Pub/Sub.
#[derive(Clone)]
pub struct RedisEventPublisher {
    publisher: Client,
    prefix: String,
}

impl RedisEventPublisher {
    /// Connect a publisher client.
    pub async fn new(redis_url: &str, prefix: &str) -> Result<Self, RedisError> {
        let config = RedisConfig::from_url(redis_url)?;

        let publisher = Client::new(config, None, None, None);
        publisher.init().await?;

        info!("Redis event publisher initialized");

        Ok(Self {
            publisher,
            prefix: prefix.to_string(),
        })
    }

    async fn publish_raw(&self, channel: &str, payload: String) -> AppResult<()> {
        let _: () = self
            .publisher
            .publish(channel, payload)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(())
    }

    /// Close the connection.
    pub async fn quit(&self) -> Result<(), RedisError> {
        self.publisher.quit().await
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish_main_stream(&self, user_id: &str, event: &NoteReadEvent) -> AppResult<()> {
        let channel = main_stream_channel(&self.prefix, user_id);
        self.publish_raw(&channel, envelope(event, event.body())).await?;
        debug!(channel = %channel, event = event.name(), "Published main stream event");
        Ok(())
    }

    async fn push_notification(&self, user_id: &str, event: &NoteReadEvent) -> AppResult<()> {
        let Some(body) = event.push_body() else {
            return Ok(());
        };

        let channel = push_channel(&self.prefix, user_id);
        self.publish_raw(&channel, envelope(event, body)).await?;
        debug!(channel = %channel, event = event.name(), "Published push notification");
        Ok(())
    }
}

/// Subscription to the note read command channel.
pub struct CommandSubscriber {
    subscriber: SubscriberClient,
    channel: String,
}

impl CommandSubscriber {
    /// Connect and subscribe to `channel`.
    pub async fn connect(redis_url: &str, channel: &str) -> Result<Self, RedisError> {
        let config = RedisConfig::from_url(redis_url)?;

        let subscriber = SubscriberClient::new(config, None, None, None);
        subscriber.init().await?;
        subscriber.subscribe(channel).await?;

        info!(channel, "Subscribed to command channel");

        Ok(Self {
            subscriber,
            channel: channel.to_string(),
        })
    }

    /// Stream of messages received on the subscription.
    pub fn messages(&self) -> broadcast::Receiver<Message> {
        self.subscriber.message_rx()
    }

    /// Unsubscribe and close the connection.
    pub async fn close(&self) -> Result<(), RedisError> {
        self.subscriber.unsubscribe(&self.channel).await?;
        self.subscriber.quit().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names() {
        assert_eq!(
            main_stream_channel("misskey", "user1"),
            "misskey:mainStream:user1"
        );
        assert_eq!(push_channel("mk", "user1"), "mk:push:user1");
    }

    #[test]
    fn test_stream_envelope() {
        let event = NoteReadEvent::UnreadMention {
            note_id: "note1".to_string(),
        };
        let payload: Value = serde_json::from_str(&envelope(&event, event.body())).unwrap();

        assert_eq!(payload, json!({ "type": "unreadMention", "body": "note1" }));
    }

    #[test]
    fn test_read_all_envelope_has_null_body() {
        let event = NoteReadEvent::ReadAllAntennas;
        let payload: Value =
            serde_json::from_str(&envelope(&event, event.push_body().unwrap())).unwrap();

        assert_eq!(payload, json!({ "type": "readAllAntennas", "body": null }));
    }
}
