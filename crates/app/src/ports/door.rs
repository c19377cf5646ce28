//! Door actuator port. The hardware (or transport) that moves the lock.

use std::future::Future;

use portier_domain::door::DoorCommand;
use portier_domain::error::PortierError;

/// Sends commands to the physical entry door.
///
/// Commands are best effort: a successful call only means the command was
/// handed to the transport, not that the door observed it (it may be propped
/// open). Callers bound every call with their own deadline.
pub trait DoorActuator: Send + Sync {
    /// Engage the lock.
    fn lock(&self) -> impl Future<Output = Result<(), PortierError>> + Send;

    /// Release the lock so the door can be pushed open.
    fn unlock(&self) -> impl Future<Output = Result<(), PortierError>> + Send;

    /// Momentarily release the latch (buzzer).
    fn open(&self) -> impl Future<Output = Result<(), PortierError>> + Send;

    /// Dispatch a [`DoorCommand`] to the matching method.
    fn send(&self, command: DoorCommand) -> impl Future<Output = Result<(), PortierError>> + Send {
        async move {
            match command {
                DoorCommand::Lock => self.lock().await,
                DoorCommand::Unlock => self.unlock().await,
                DoorCommand::Open => self.open().await,
            }
        }
    }
}

impl<T: DoorActuator> DoorActuator for std::sync::Arc<T> {
    fn lock(&self) -> impl Future<Output = Result<(), PortierError>> + Send {
        (**self).lock()
    }

    fn unlock(&self) -> impl Future<Output = Result<(), PortierError>> + Send {
        (**self).unlock()
    }

    fn open(&self) -> impl Future<Output = Result<(), PortierError>> + Send {
        (**self).open()
    }
}
