//! Error types for the radiomesh simulator

use thiserror::Error;

use crate::identity::DeviceId;
use crate::protocol::ProtocolKind;

/// Errors surfaced by the simulation engine
///
/// Nothing here is fatal to the simulation loop; most failure modes
/// (unsupported receipts, handshake timeouts, TTL exhaustion) are logged
/// and absorbed where they occur.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    /// Attempted to finalize a link to a peer outside admissibility
    #[error("invalid connection: {local} cannot reach {peer} over {kind}")]
    InvalidConnection {
        local: DeviceId,
        peer: DeviceId,
        kind: ProtocolKind,
    },

    /// The named protocol is not attached to the device
    #[error("protocol {kind} is not attached to {device}")]
    ProtocolNotAttached { device: DeviceId, kind: ProtocolKind },
}

/// Result type for engine operations
pub type MeshResult<T> = Result<T, MeshError>;
