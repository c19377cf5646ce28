//! The door backend selected in `[door] backend`.

use portier_adapter_mqtt::{MqttDoor, MqttError};
use portier_adapter_virtual::VirtualDoor;
use portier_app::ports::DoorActuator;
use portier_domain::error::PortierError;

use crate::config::{Config, DoorBackend};

/// Either of the door adapters, dispatched statically.
pub enum ConfiguredDoor {
    Virtual(VirtualDoor),
    Mqtt(MqttDoor),
}

impl ConfiguredDoor {
    /// Build the configured backend. The MQTT event loop is spawned on the
    /// current runtime.
    ///
    /// # Errors
    ///
    /// Returns an [`MqttError`] if the MQTT client cannot be set up.
    pub fn connect(config: &Config) -> Result<Self, MqttError> {
        match config.door.backend {
            DoorBackend::Virtual => Ok(Self::Virtual(VirtualDoor::new())),
            DoorBackend::Mqtt => MqttDoor::connect(&config.mqtt).map(Self::Mqtt),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Virtual(_) => "virtual",
            Self::Mqtt(_) => "mqtt",
        }
    }

    pub async fn teardown(&self) {
        if let Self::Mqtt(door) = self {
            door.teardown().await;
        }
    }
}

impl DoorActuator for ConfiguredDoor {
    async fn lock(&self) -> Result<(), PortierError> {
        match self {
            Self::Virtual(door) => door.lock().await,
            Self::Mqtt(door) => door.lock().await,
        }
    }

    async fn unlock(&self) -> Result<(), PortierError> {
        match self {
            Self::Virtual(door) => door.unlock().await,
            Self::Mqtt(door) => door.unlock().await,
        }
    }

    async fn open(&self) -> Result<(), PortierError> {
        match self {
            Self::Virtual(door) => door.open().await,
            Self::Mqtt(door) => door.open().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use portier_domain::door::DoorCommand;

    use super::*;

    #[tokio::test]
    async fn should_build_virtual_door_by_default() {
        let door = ConfiguredDoor::connect(&Config::default()).unwrap();
        assert_eq!(door.name(), "virtual");

        door.send(DoorCommand::Unlock).await.unwrap();

        let ConfiguredDoor::Virtual(inner) = &door else {
            panic!("expected the virtual backend");
        };
        assert_eq!(inner.commands(), vec![DoorCommand::Unlock]);
        door.teardown().await;
    }
}
