//! AMQP 0-9-1 adapter over `lapin`.

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::uri::AMQPUri;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};

use crate::{Broker, BrokerChannel, QueueError};

/// AMQP `delivery_mode` asking the broker to write the message to disk.
const PERSISTENT: u8 = 2;

const REPLY_SUCCESS: u16 = 200;

/// Where and as whom to connect.
#[derive(Clone, Debug)]
pub struct AmqpSettings {
    pub host: String,
    pub port: u16,
    pub vhost: String,
    pub username: String,
    pub password: String,
}

impl AmqpSettings {
    fn uri(&self) -> AMQPUri {
        let mut uri = AMQPUri::default();
        uri.authority.host = self.host.clone();
        uri.authority.port = self.port;
        uri.authority.userinfo.username = self.username.clone();
        uri.authority.userinfo.password = self.password.clone();
        uri.vhost = self.vhost.clone();
        uri
    }
}

pub struct AmqpBroker {
    settings: AmqpSettings,
}

impl AmqpBroker {
    pub fn new(settings: AmqpSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Broker for AmqpBroker {
    async fn connect(&self) -> Result<Box<dyn BrokerChannel>, QueueError> {
        if self.settings.username.is_empty() || self.settings.password.is_empty() {
            return Err(QueueError::MissingCredentials);
        }
        let connection = Connection::connect_uri(self.settings.uri(), ConnectionProperties::default())
            .await
            .map_err(|e| QueueError::Connect(e.to_string()))?;
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| QueueError::Connect(e.to_string()))?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| QueueError::Connect(e.to_string()))?;
        tracing::debug!(host = %self.settings.host, port = self.settings.port, "connected to broker");
        Ok(Box::new(AmqpChannel {
            connection,
            channel,
        }))
    }
}

struct AmqpChannel {
    connection: Connection,
    channel: Channel,
}

#[async_trait]
impl BrokerChannel for AmqpChannel {
    async fn declare_durable_queue(&self, queue: &str) -> Result<(), QueueError> {
        self.channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| QueueError::Declare(e.to_string()))?;
        Ok(())
    }

    async fn publish_persistent(&self, queue: &str, payload: &[u8]) -> Result<(), QueueError> {
        let confirmation = self
            .channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default().with_delivery_mode(PERSISTENT),
            )
            .await
            .map_err(|e| QueueError::Publish(e.to_string()))?
            .await
            .map_err(|e| QueueError::Publish(e.to_string()))?;
        if confirmation.is_nack() {
            return Err(QueueError::Publish("broker rejected the message".into()));
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), QueueError> {
        self.channel
            .close(REPLY_SUCCESS, "producer shutdown")
            .await
            .map_err(|e| QueueError::Publish(e.to_string()))?;
        self.connection
            .close(REPLY_SUCCESS, "producer shutdown")
            .await
            .map_err(|e| QueueError::Publish(e.to_string()))?;
        Ok(())
    }
}
