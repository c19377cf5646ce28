//! MQTT door configuration.

use serde::Deserialize;

/// Configuration for the MQTT door backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Topic prefix; commands go to `{base_topic}/{command}`.
    pub base_topic: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Quality of service for command messages (0, 1 or 2).
    pub qos: u8,
    /// Pause before reconnecting after the broker dropped us, in seconds.
    pub reconnect_delay_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "portier".to_string(),
            base_topic: "portier/door".to_string(),
            keep_alive_secs: 30,
            qos: 1,
            reconnect_delay_secs: 5,
        }
    }
}
