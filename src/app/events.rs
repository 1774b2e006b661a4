//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them (serial log in production, a
//! recording vector in tests).

use super::debounce::IngestOutcome;
use super::switch_bank::SwitchId;
use crate::error::{BrokerError, ConnectivityError, StorageError};
use crate::identity::ClientId;

/// Why the device is about to reboot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    /// Every network cycle in the budget failed.
    NetworkExhausted,
    /// Every broker CONNECT attempt failed.
    BrokerExhausted,
    /// The reset input was held; credentials were wiped.
    ManualReset,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Switch states restored from storage at boot.
    Restored([bool; 4]),

    /// A switch output changed by command.
    SwitchChanged { id: SwitchId, on: bool },

    /// All switch outputs set by `sw1234`.
    AllSwitchesChanged(bool),

    /// A switch record could not be persisted.
    PersistFailed(StorageError),

    /// One RF sample went through the debouncer.
    RfSample {
        code: u64,
        bit_length: u32,
        outcome: IngestOutcome,
    },

    /// A network connection cycle started.
    NetworkConnecting { cycles_left: u32 },

    /// The link layer refused to start association.
    NetworkBeginFailed(ConnectivityError),

    /// The active attempt window expired; passively waiting.
    NetworkWaiting,

    /// A full cycle (attempts + wait) failed.
    NetworkCycleFailed { cycles_left: u32 },

    NetworkUp,
    NetworkLost,

    /// A broker CONNECT was issued.
    SessionConnecting { client_id: ClientId, attempts_left: u32 },

    SessionAttemptFailed { attempts_left: u32 },

    SessionUp { client_id: ClientId },

    /// The broker dropped an established session.
    SessionLost,

    SubscribeFailed(BrokerError),

    /// Inbound text matched no command.
    CommandIgnored(heapless::String<64>),

    /// A best-effort publish failed.
    PublishFailed(BrokerError),

    /// Manual reset input went active; hold to confirm.
    ResetArmed,

    /// Manual reset input released before the hold completed.
    ResetCancelled,

    /// Credentials could not be fully erased during a manual reset.
    CredentialEraseFailed,

    /// Device restart issued.
    Restarting(RestartReason),
}
