//! MQTT adapter error types.

use portier_domain::error::PortierError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// No broker connection is established (yet, or anymore).
    #[error("MQTT client not connected")]
    NotConnected,

    /// The configured QoS is not 0, 1 or 2.
    #[error("invalid MQTT QoS level {0}")]
    InvalidQos(u8),

    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// Failed to serialize a command payload as JSON.
    #[error("failed to encode MQTT payload")]
    PayloadEncode(#[source] serde_json::Error),
}

impl MqttError {
    /// Convert into a [`PortierError::Hardware`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> PortierError {
        PortierError::hardware(self)
    }
}

impl From<MqttError> for PortierError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
