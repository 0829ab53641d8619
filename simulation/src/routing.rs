//! Routing algorithms: where a packet goes next
//!
//! A routing algorithm decides what to do with a packet that is not
//! destined to the local device (or that the local device wants to send
//! without a direct link). The variant set is closed. TTL is the only
//! loop protection; every routing decision burns one hop.

use rand::seq::IndexedRandom;
use tracing::{debug, trace};

use radiomesh_core::{DeviceId, Packet, Protocol};

use crate::simulation::Simulation;

/// The closed set of routing algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// Forward to every connected neighbor except the sender
    Flood,
    /// Forward to one uniformly chosen established neighbor
    Random,
}

impl Routing {
    /// Periodic hook, invoked before the active task each tick
    pub(crate) fn step(self, _sim: &mut Simulation, _device: DeviceId) {
        // neither variant does periodic work
    }

    /// Route a packet, or drop it if it cannot be routed
    pub(crate) fn route(
        self,
        sim: &mut Simulation,
        device: DeviceId,
        sender: DeviceId,
        proto: Option<Protocol>,
        packet: Packet,
    ) {
        match self {
            Routing::Flood => flood_route(sim, device, sender, proto, packet),
            Routing::Random => random_route(sim, device, sender, proto, packet),
        }
    }
}

fn flood_route(
    sim: &mut Simulation,
    device: DeviceId,
    sender: DeviceId,
    proto: Option<Protocol>,
    packet: Packet,
) {
    if packet.ttl == 0 {
        trace!("ttl exhausted, packet from {} dropped", packet.source);
        return;
    }
    let packet = packet.with_ttl(packet.ttl - 1);
    let destination = packet.destination;

    if sim.device(sender).is_connected(destination) {
        debug!("sending packet directly to {}", destination);
        sim.send_packet(device, proto, packet, destination);
        return;
    }

    let connections: Vec<_> = sim.device(device).connections.iter().copied().collect();
    trace!(
        "{} flooding packet over {} connections",
        sim.device(device).name,
        connections.len()
    );
    for (kind, neighbor) in connections {
        if neighbor == sender {
            continue;
        }
        let Some(p) = sim.device(device).protocol_of_kind(kind) else {
            continue;
        };
        sim.send_packet(device, Some(p), packet.clone(), neighbor);
    }
}

fn random_route(
    sim: &mut Simulation,
    device: DeviceId,
    _sender: DeviceId,
    proto: Option<Protocol>,
    packet: Packet,
) {
    if packet.ttl == 0 {
        trace!("ttl exhausted, packet from {} dropped", packet.source);
        return;
    }
    let packet = packet.with_ttl(packet.ttl - 1);

    let neighbors = sim.device(device).established_neighbors();
    match neighbors.choose(sim.rng_mut()).copied() {
        Some(next_hop) => sim.send_packet(device, proto, packet, next_hop),
        // packet dropped if there are no neighbors
        None => trace!("{} has no established neighbors", sim.device(device).name),
    }
}
