//! Devices and their per-tick state
//!
//! A device owns its radios, its task queue and its connection records.
//! Everything that needs to touch *another* device goes through the
//! [`Simulation`](crate::simulation::Simulation) by id; the device struct
//! itself is plain data plus a few local queries.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use rand::Rng;

use radiomesh_core::{DeviceId, Packet, Protocol, ProtocolKind};

use crate::layout::{FloodLayout, Layout};
use crate::routing::Routing;
use crate::tasks::Task;

/// Scan interval of the micro:bit-class device profile
pub const MICROBIT_SCAN_INTERVAL: u32 = 300;

/// A mobile device participating in the mesh
#[derive(Debug)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    /// Radios attached to this device; each instance belongs to it alone
    pub protocols: Vec<Protocol>,
    /// Pending work; the head is the currently active task
    pub tasks: VecDeque<Task>,
    /// Directional connection records: this side's half of each link
    pub connections: BTreeSet<(ProtocolKind, DeviceId)>,
    /// Non-handshake packets received, keyed by the tick of receipt
    pub received_packets: BTreeMap<u64, Vec<Packet>>,
    /// Data submitted to the network by this device as a source
    pub own_data: u64,
    /// Total data forwarded by this device, including as source
    pub total_data: u64,
    /// Energy spent on scans so far
    pub consumed_energy: u64,
    pub layout: Layout,
    pub routing: Routing,
}

impl Device {
    pub fn new(
        id: DeviceId,
        name: impl Into<String>,
        protocols: Vec<Protocol>,
        layout: Layout,
        routing: Routing,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            protocols,
            tasks: VecDeque::new(),
            connections: BTreeSet::new(),
            received_packets: BTreeMap::new(),
            own_data: 0,
            total_data: 0,
            consumed_energy: 0,
            layout,
            routing,
        }
    }

    /// A micro:bit-class device: BLE plus 2.4 GHz Wi-Fi, flood layout and
    /// flood routing
    pub fn microbit(id: DeviceId, scan_interval: u32, rng: &mut impl Rng) -> Self {
        Self::new(
            id,
            format!("Agent {}", id.0),
            vec![Protocol::ble(), Protocol::wifi24()],
            Layout::Flood(FloodLayout::new(scan_interval, rng)),
            Routing::Flood,
        )
    }

    /// Whether a radio of this kind is attached
    pub fn owns_kind(&self, kind: ProtocolKind) -> bool {
        self.protocols.iter().any(|p| p.kind == kind)
    }

    /// This device's radio of the given kind
    pub fn protocol_of_kind(&self, kind: ProtocolKind) -> Option<Protocol> {
        self.protocols.iter().find(|p| p.kind == kind).copied()
    }

    /// Whether any connection record points at `peer`
    pub fn is_connected(&self, peer: DeviceId) -> bool {
        self.connections.iter().any(|(_, other)| *other == peer)
    }

    /// Peers this device holds connection records for, deduplicated
    pub fn established_neighbors(&self) -> Vec<DeviceId> {
        let peers: BTreeSet<DeviceId> = self.connections.iter().map(|(_, peer)| *peer).collect();
        peers.into_iter().collect()
    }

    /// Whether a link negotiation with `peer` is already queued or running
    pub fn has_handshake_for(&self, peer: DeviceId) -> bool {
        self.tasks
            .iter()
            .any(|task| task.handshake_peer() == Some(peer))
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
