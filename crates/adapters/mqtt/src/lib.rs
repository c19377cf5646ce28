//! # portier-adapter-mqtt
//!
//! MQTT adapter. Drives the entry door through a relay controller that
//! listens on an MQTT broker.
//!
//! ## Topics
//!
//! | Command | Topic | Payload |
//! |---------|-------|---------|
//! | lock | `{base_topic}/lock` | `{"command":"lock","issued_at":"…"}` |
//! | unlock | `{base_topic}/unlock` | `{"command":"unlock","issued_at":"…"}` |
//! | open | `{base_topic}/open` | `{"command":"open","issued_at":"…"}` |
//!
//! Messages use the configured QoS and are never retained: a controller
//! coming back online must not replay a stale command.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `portier-app` and `portier-domain`.

mod config;
mod error;

pub use config::MqttConfig;
pub use error::MqttError;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use serde::Serialize;
use tokio::task::JoinHandle;

use portier_app::ports::DoorActuator;
use portier_domain::door::DoorCommand;
use portier_domain::error::PortierError;
use portier_domain::time::{self, Timestamp};

/// Capacity of the request queue between the client and its event loop.
const REQUEST_CAPACITY: usize = 10;

#[derive(Debug, Serialize)]
struct CommandPayload {
    command: DoorCommand,
    issued_at: Timestamp,
}

/// A door whose relay controller is reached over MQTT.
pub struct MqttDoor {
    client: AsyncClient,
    qos: QoS,
    base_topic: String,
    connected: Arc<AtomicBool>,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl MqttDoor {
    /// Create the client and spawn its event loop on the current runtime.
    ///
    /// The broker connection is established in the background; commands
    /// fail with [`MqttError::NotConnected`] until it is up.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::InvalidQos`] if the configured QoS is not 0, 1 or 2.
    pub fn connect(config: &MqttConfig) -> Result<Self, MqttError> {
        let qos = qos(config.qos)?;

        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let connected = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(drive(
            event_loop,
            Arc::clone(&connected),
            Duration::from_secs(u64::from(config.reconnect_delay_secs)),
        ));

        tracing::info!(
            host = %config.broker_host,
            port = config.broker_port,
            base_topic = %config.base_topic,
            "MQTT door backend started"
        );

        Ok(Self {
            client,
            qos,
            base_topic: config.base_topic.trim_end_matches('/').to_string(),
            connected,
            event_loop: Mutex::new(Some(handle)),
        })
    }

    /// Whether the broker acknowledged our connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Topic a command is published on.
    #[must_use]
    pub fn topic(&self, command: DoorCommand) -> String {
        format!("{}/{command}", self.base_topic)
    }

    async fn publish(&self, command: DoorCommand) -> Result<(), MqttError> {
        if !self.is_connected() {
            return Err(MqttError::NotConnected);
        }

        let payload = serde_json::to_vec(&CommandPayload {
            command,
            issued_at: time::now(),
        })
        .map_err(MqttError::PayloadEncode)?;

        self.client
            .publish(self.topic(command), self.qos, false, payload)
            .await
            .map_err(MqttError::Client)?;

        tracing::debug!(%command, "published door command");
        Ok(())
    }

    /// Disconnect from the broker and stop the event loop.
    pub async fn teardown(&self) {
        if let Err(err) = self.client.disconnect().await {
            tracing::warn!(%err, "failed to disconnect from MQTT broker");
        }
        let handle = self
            .event_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
            tracing::debug!("MQTT event loop aborted");
        }
        self.connected.store(false, Ordering::SeqCst);
        tracing::info!("MQTT door backend stopped");
    }
}

impl DoorActuator for MqttDoor {
    async fn lock(&self) -> Result<(), PortierError> {
        self.publish(DoorCommand::Lock)
            .await
            .map_err(MqttError::into_domain)
    }

    async fn unlock(&self) -> Result<(), PortierError> {
        self.publish(DoorCommand::Unlock)
            .await
            .map_err(MqttError::into_domain)
    }

    async fn open(&self) -> Result<(), PortierError> {
        self.publish(DoorCommand::Open)
            .await
            .map_err(MqttError::into_domain)
    }
}

fn qos(level: u8) -> Result<QoS, MqttError> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(MqttError::InvalidQos(other)),
    }
}

/// Poll the event loop until the client disconnects. rumqttc reconnects on
/// the next poll after an error.
async fn drive(mut event_loop: EventLoop, connected: Arc<AtomicBool>, reconnect_delay: Duration) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                connected.store(true, Ordering::SeqCst);
                tracing::info!(code = ?ack.code, "connected to MQTT broker");
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                connected.store(false, Ordering::SeqCst);
                tracing::debug!("MQTT client disconnected");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                if connected.swap(false, Ordering::SeqCst) {
                    tracing::warn!(%err, "lost connection to MQTT broker");
                } else {
                    tracing::debug!(%err, "MQTT broker unreachable");
                }
                tokio::time::sleep(reconnect_delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_broker() -> MqttConfig {
        MqttConfig {
            broker_host: "127.0.0.1".to_string(),
            broker_port: 1,
            base_topic: "office/entry/".to_string(),
            ..MqttConfig::default()
        }
    }

    #[test]
    fn should_map_qos_levels() {
        assert_eq!(qos(0).unwrap(), QoS::AtMostOnce);
        assert_eq!(qos(1).unwrap(), QoS::AtLeastOnce);
        assert_eq!(qos(2).unwrap(), QoS::ExactlyOnce);
        assert!(matches!(qos(3), Err(MqttError::InvalidQos(3))));
    }

    #[test]
    fn should_encode_command_payload() {
        let payload = CommandPayload {
            command: DoorCommand::Unlock,
            issued_at: time::now(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["command"], "unlock");
        assert!(value["issued_at"].is_string());
    }

    #[tokio::test]
    async fn should_reject_invalid_qos_on_connect() {
        let config = MqttConfig {
            qos: 7,
            ..unreachable_broker()
        };
        assert!(matches!(
            MqttDoor::connect(&config),
            Err(MqttError::InvalidQos(7))
        ));
    }

    #[tokio::test]
    async fn should_build_topics_below_base_topic() {
        let door = MqttDoor::connect(&unreachable_broker()).unwrap();
        assert_eq!(door.topic(DoorCommand::Lock), "office/entry/lock");
        assert_eq!(door.topic(DoorCommand::Open), "office/entry/open");
        door.teardown().await;
    }

    #[tokio::test]
    async fn should_refuse_commands_without_broker_connection() {
        let door = MqttDoor::connect(&unreachable_broker()).unwrap();

        let result = door.lock().await;

        assert!(matches!(result, Err(PortierError::Hardware(_))));
        assert!(!door.is_connected());
        door.teardown().await;
    }
}
