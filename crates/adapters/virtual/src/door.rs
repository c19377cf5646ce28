//! A door that only exists in memory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use portier_app::ports::DoorActuator;
use portier_domain::door::{DoorCommand, DoorState};
use portier_domain::error::PortierError;

use crate::error::VirtualDoorError;

/// Simulated door. Every accepted command is appended to a journal.
#[derive(Debug, Default)]
pub struct VirtualDoor {
    journal: Mutex<Vec<DoorCommand>>,
    offline: AtomicBool,
}

impl VirtualDoor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every command fails with [`VirtualDoorError::Offline`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// All commands accepted so far, oldest first.
    #[must_use]
    pub fn commands(&self) -> Vec<DoorCommand> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The lock position implied by the last `lock`/`unlock` command.
    #[must_use]
    pub fn lock_state(&self) -> Option<DoorState> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find_map(|command| match command {
                DoorCommand::Lock => Some(DoorState::Locked),
                DoorCommand::Unlock => Some(DoorState::Unlocked),
                DoorCommand::Open => None,
            })
    }

    fn accept(&self, command: DoorCommand) -> Result<(), PortierError> {
        if self.offline.load(Ordering::SeqCst) {
            tracing::debug!(%command, "virtual door offline, rejecting command");
            return Err(VirtualDoorError::Offline.into_domain());
        }
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
        tracing::info!(%command, "virtual door command");
        Ok(())
    }
}

impl DoorActuator for VirtualDoor {
    async fn lock(&self) -> Result<(), PortierError> {
        self.accept(DoorCommand::Lock)
    }

    async fn unlock(&self) -> Result<(), PortierError> {
        self.accept(DoorCommand::Unlock)
    }

    async fn open(&self) -> Result<(), PortierError> {
        self.accept(DoorCommand::Open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_record_commands_in_order() {
        let door = VirtualDoor::new();
        door.unlock().await.unwrap();
        door.open().await.unwrap();
        door.lock().await.unwrap();

        assert_eq!(
            door.commands(),
            vec![DoorCommand::Unlock, DoorCommand::Open, DoorCommand::Lock]
        );
    }

    #[tokio::test]
    async fn should_derive_lock_state_ignoring_open() {
        let door = VirtualDoor::new();
        assert_eq!(door.lock_state(), None);

        door.unlock().await.unwrap();
        door.open().await.unwrap();

        assert_eq!(door.lock_state(), Some(DoorState::Unlocked));
    }

    #[tokio::test]
    async fn should_fail_while_offline() {
        let door = VirtualDoor::new();
        door.set_offline(true);

        let result = door.send(DoorCommand::Lock).await;

        assert!(matches!(result, Err(PortierError::Hardware(_))));
        assert!(door.commands().is_empty());

        door.set_offline(false);
        door.send(DoorCommand::Lock).await.unwrap();
        assert_eq!(door.lock_state(), Some(DoorState::Locked));
    }
}
