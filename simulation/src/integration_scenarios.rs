//! End-to-end scenarios through the full engine
//!
//! These drive whole simulations tick by tick: scan discovery feeding
//! link negotiation, flood routing across a relay chain, stale links
//! dropping mid-transfer, and the metric trajectory staying consistent
//! along the way.

use radiomesh_core::{DeviceId, Packet, Protocol};

use crate::layout::{FloodLayout, Layout};
use crate::simulation::{SimConfig, Simulation};
use crate::tasks::{HandshakeTask, Task};

/// Two devices in mutual BLE range pair up through the ordinary
/// scan/discovery/handshake flow.
#[test]
fn test_in_range_devices_pair_up() {
    let mut sim = Simulation::with_positions(
        SimConfig {
            width: 100,
            height: 100,
            ..Default::default()
        },
        &[(10, 10), (13, 14)],
    );
    let (a, b) = (DeviceId(0), DeviceId(1));

    // stagger scan phases so neither peer is mid-scan when the other's
    // REQUEST arrives
    sim.device_mut(a).layout = Layout::Flood(FloodLayout::with_phase(300, 3));
    sim.device_mut(b).layout = Layout::Flood(FloodLayout::with_phase(300, 28));

    sim.run_ticks(60);

    assert!(sim.is_connected(a, b), "initiator side missing its record");
    assert!(sim.is_connected(b, a), "responder side missing its record");
    assert_eq!(sim.established_link_count(), 1);
}

/// A directly queued negotiation converges within a few ticks no matter
/// which device the scheduler visits first.
#[test]
fn test_handshake_completes_within_timeout() {
    let mut sim = Simulation::with_positions(
        SimConfig {
            width: 100,
            height: 100,
            ..Default::default()
        },
        &[(0, 0), (3, 4)],
    );
    let (a, b) = (DeviceId(0), DeviceId(1));

    // park the scan machinery so nothing competes for the queues
    for id in [a, b] {
        sim.device_mut(id).layout = Layout::Flood(FloodLayout::with_phase(300, 100));
    }

    sim.queue_task(a, Task::Handshake(HandshakeTask::client(b, Protocol::ble())));
    sim.run_ticks(5);

    assert!(sim.is_connected(a, b));
    assert!(sim.is_connected(b, a));
}

/// Devices outside radio range stay unconnected and the topology stays
/// two isolated components.
#[test]
fn test_out_of_range_devices_stay_isolated() {
    let mut sim = Simulation::with_positions(
        SimConfig {
            width: 150,
            height: 150,
            ..Default::default()
        },
        &[(0, 0), (100, 100)],
    );
    let (a, b) = (DeviceId(0), DeviceId(1));

    sim.run_ticks(60);

    assert!(!sim.is_connected(a, b));
    assert!(!sim.is_connected(b, a));
    // two isolated components in both graphs: the ratio stays 1/1
    let row = sim.collector().latest().unwrap();
    assert_eq!(row.reachability, 1.0);
}

/// A packet from A destined to C crosses the established A - B - C chain
/// through flood routing, burning one TTL hop per routing decision.
#[test]
fn test_packet_crosses_relay_chain() {
    let mut sim = Simulation::with_positions(
        SimConfig {
            width: 200,
            height: 200,
            ..Default::default()
        },
        &[(0, 100), (35, 100), (70, 100)],
    );
    let (a, b, c) = (DeviceId(0), DeviceId(1), DeviceId(2));

    let ble = Protocol::ble();
    for (from, to) in [(a, b), (b, a), (b, c), (c, b)] {
        sim.connect(from, to, &ble).unwrap();
    }
    assert!(!sim.is_connected(a, c), "chain must not short-circuit");

    let packet = Packet::data(a, c, 5);
    let initial_ttl = packet.initial_ttl;
    sim.send_packet_any_protocol(a, packet, c);
    sim.run_ticks(60);

    let delivered: Vec<&Packet> = sim
        .device(c)
        .received_packets
        .values()
        .flatten()
        .collect();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].hops(), 2);
    assert!(delivered[0].hops() <= initial_ttl);
}

/// Without an established chain the flooded packet dies quietly.
#[test]
fn test_packet_without_chain_is_lost() {
    let mut sim = Simulation::with_positions(
        SimConfig {
            width: 200,
            height: 200,
            ..Default::default()
        },
        &[(0, 100), (35, 100), (70, 100)],
    );
    let (a, c) = (DeviceId(0), DeviceId(2));

    sim.send_packet_any_protocol(a, Packet::data(a, c, 5), c);
    sim.run_ticks(30);

    let delivered: usize = sim.device(c).received_packets.values().map(Vec::len).sum();
    assert_eq!(delivered, 0);
}

/// A peer that wanders out of range mid-transfer: the connection is
/// purged, the transfer re-routes instead of delivering, and the task
/// finishes without error.
#[test]
fn test_transfer_survives_peer_moving_out_of_range() {
    let mut sim = Simulation::with_positions(
        SimConfig {
            width: 150,
            height: 150,
            ..Default::default()
        },
        &[(0, 0), (3, 4)],
    );
    let (a, b) = (DeviceId(0), DeviceId(1));

    let ble = Protocol::ble();
    sim.connect(a, b, &ble).unwrap();
    sim.connect(b, a, &ble).unwrap();

    // size 40 over bandwidth 10 keeps the transfer busy for several ticks
    sim.send_packet(a, Some(ble), Packet::data(a, b, 40), b);
    sim.step();

    sim.place_device(b, (120, 120));
    sim.run_ticks(5);

    assert!(!sim.is_connected(a, b));
    let delivered: usize = sim.device(b).received_packets.values().map(Vec::len).sum();
    assert_eq!(delivered, 0, "the packet must not arrive after the link died");
    assert!(
        sim.device(a)
            .tasks
            .iter()
            .all(|t| !matches!(t, Task::SendPacket(_))),
        "the transfer task must have completed and drained"
    );
}

/// Handshake exclusivity: no device ever queues two negotiations for the
/// same peer, however busy the discovery traffic gets.
#[test]
fn test_at_most_one_handshake_per_peer() {
    let mut sim = Simulation::new(SimConfig {
        n_agents: 6,
        width: 30,
        height: 30,
        seed: 7,
        scan_interval: 40,
    });

    for _ in 0..120 {
        sim.step();
        for id in sim.device_ids() {
            let mut peers: Vec<DeviceId> = sim
                .device(id)
                .tasks
                .iter()
                .filter_map(|t| t.handshake_peer())
                .collect();
            let total = peers.len();
            peers.sort();
            peers.dedup();
            assert_eq!(peers.len(), total, "duplicate negotiation in {}", id);
        }
    }
}

/// Counter coherence across a long mixed run.
#[test]
fn test_counter_coherence() {
    let mut sim = Simulation::new(SimConfig {
        n_agents: 8,
        width: 30,
        height: 30,
        seed: 3,
        scan_interval: 60,
    });
    sim.run_ticks(200);

    for id in sim.device_ids() {
        let device = sim.device(id);
        assert!(device.own_data <= device.total_data);
    }
}

/// Metric codomain across a live run: reachability and power stay inside
/// [0, 1], fairness inside [0, 1].
#[test]
fn test_metric_codomain_on_live_runs() {
    let mut sim = Simulation::new(SimConfig {
        n_agents: 6,
        width: 25,
        height: 25,
        seed: 11,
        scan_interval: 50,
    });
    sim.run_ticks(150);

    for row in sim.collector().rows() {
        assert!((0.0..=1.0).contains(&row.reachability), "tick {}", row.tick);
        assert!((0.0..=1.0).contains(&row.power_efficiency), "tick {}", row.tick);
        assert!((0.0..=1.0).contains(&row.fairness), "tick {}", row.tick);
        assert!(row.average_transit_time >= 0.0);
    }
}
