//! Packets exchanged between devices
//!
//! Packets carry a size estimate and a TTL but no payload; the simulator
//! only cares about how much data moved and how far. Link negotiation
//! uses the same type with a [`HandshakePhase`] tag and size 1.

use serde::{Deserialize, Serialize};

use crate::identity::DeviceId;

/// Default TTL for application packets
pub const DEFAULT_TTL: u32 = 30;

/// Phases of the three-way link negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandshakePhase {
    /// Initiator -> responder
    Request,
    /// Responder back to initiator
    Response,
    /// Initiator confirms; both sides record the link
    Establish,
}

impl std::fmt::Display for HandshakePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandshakePhase::Request => write!(f, "REQUEST"),
            HandshakePhase::Response => write!(f, "RESPONSE"),
            HandshakePhase::Establish => write!(f, "ESTABLISH"),
        }
    }
}

/// What a packet carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketKind {
    /// Application traffic
    Data,
    /// Link negotiation
    Handshake(HandshakePhase),
}

/// An immutable message in flight between two devices
///
/// `initial_ttl` is fixed at construction and never decremented; the
/// difference `initial_ttl - ttl` is the hop count a packet accumulated,
/// which feeds the transit-time metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub source: DeviceId,
    pub destination: DeviceId,
    pub size_estimate: u32,
    pub ttl: u32,
    pub initial_ttl: u32,
    pub kind: PacketKind,
}

impl Packet {
    /// Create an application packet with the default TTL
    pub fn data(source: DeviceId, destination: DeviceId, size_estimate: u32) -> Self {
        Self::data_with_ttl(source, destination, size_estimate, DEFAULT_TTL)
    }

    /// Create an application packet with an explicit TTL
    pub fn data_with_ttl(
        source: DeviceId,
        destination: DeviceId,
        size_estimate: u32,
        ttl: u32,
    ) -> Self {
        Self {
            source,
            destination,
            size_estimate,
            ttl,
            initial_ttl: ttl,
            kind: PacketKind::Data,
        }
    }

    /// Create a handshake packet (size 1)
    pub fn handshake(source: DeviceId, destination: DeviceId, phase: HandshakePhase) -> Self {
        Self {
            source,
            destination,
            size_estimate: 1,
            ttl: DEFAULT_TTL,
            initial_ttl: DEFAULT_TTL,
            kind: PacketKind::Handshake(phase),
        }
    }

    /// Derive a new packet with a fresh TTL, preserving everything else
    ///
    /// The derived packet's `initial_ttl` equals the new TTL.
    pub fn with_ttl(&self, ttl: u32) -> Self {
        Self {
            source: self.source,
            destination: self.destination,
            size_estimate: self.size_estimate,
            ttl,
            initial_ttl: ttl,
            kind: self.kind,
        }
    }

    /// The handshake phase tag, if this is a handshake packet
    pub fn handshake_phase(&self) -> Option<HandshakePhase> {
        match self.kind {
            PacketKind::Handshake(phase) => Some(phase),
            PacketKind::Data => None,
        }
    }

    pub fn is_handshake(&self) -> bool {
        matches!(self.kind, PacketKind::Handshake(_))
    }

    /// Hops this packet accumulated since it was created
    pub fn hops(&self) -> u32 {
        self.initial_ttl - self.ttl
    }
}

impl std::fmt::Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            PacketKind::Data => write!(
                f,
                "packet {} -> {} (size {}, ttl {})",
                self.source, self.destination, self.size_estimate, self.ttl
            ),
            PacketKind::Handshake(phase) => {
                write!(f, "handshake {} {} -> {}", phase, self.source, self.destination)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_ttl_resets_initial_ttl() {
        let pkt = Packet::data(DeviceId(0), DeviceId(1), 64);
        let derived = pkt.with_ttl(7);

        assert_eq!(derived.ttl, 7);
        assert_eq!(derived.initial_ttl, 7);
        assert_eq!(derived.source, pkt.source);
        assert_eq!(derived.destination, pkt.destination);
        assert_eq!(derived.size_estimate, pkt.size_estimate);
        assert_eq!(derived.kind, pkt.kind);
    }

    #[test]
    fn test_handshake_packets_have_size_one() {
        let pkt = Packet::handshake(DeviceId(0), DeviceId(1), HandshakePhase::Request);
        assert_eq!(pkt.size_estimate, 1);
        assert_eq!(pkt.handshake_phase(), Some(HandshakePhase::Request));
        assert!(pkt.is_handshake());
    }

    #[test]
    fn test_hop_count() {
        let pkt = Packet::data_with_ttl(DeviceId(0), DeviceId(1), 8, 10);
        assert_eq!(pkt.hops(), 0);

        let mut routed = pkt.clone();
        routed.ttl = 6;
        assert_eq!(routed.hops(), 4);

        // a fresh ttl resets the baseline
        assert_eq!(routed.with_ttl(8).hops(), 0);
    }
}
