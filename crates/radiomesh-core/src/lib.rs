//! # Radiomesh Core
//!
//! Core types for the radiomesh simulator.
//!
//! This crate provides the foundational value types shared by the
//! simulation engine and the metrics layer:
//!
//! - [`DeviceId`]: Stable arena index identifying a device in the model
//! - [`Packet`]: An immutable message with endpoints, size estimate and TTL
//! - [`HandshakePhase`]: The three phases of link negotiation
//! - [`Protocol`]: A radio attached to a device, with its characteristic
//!   scan/link attributes
//! - [`MeshError`]: Error kinds surfaced by the engine
//!
//! Everything here is value-semantic. Devices are referenced by id only;
//! the model owns the device arena and every cross-device reference is a
//! [`DeviceId`], never a pointer.

pub mod error;
pub mod identity;
pub mod packet;
pub mod protocol;

// Re-export main types
pub use error::{MeshError, MeshResult};
pub use identity::DeviceId;
pub use packet::{DEFAULT_TTL, HandshakePhase, Packet, PacketKind};
pub use protocol::{Protocol, ProtocolKind};
