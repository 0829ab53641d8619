//! Pre-built simulation scenarios
//!
//! Small, deterministic setups exercising the end-to-end flows: link
//! pairing, out-of-range isolation and multi-hop relay. Each scenario
//! returns the finished simulation so callers (and tests) can inspect
//! the final state.

use tracing::info;

use radiomesh_core::{DeviceId, Packet, ProtocolKind};

use crate::layout::{FloodLayout, Layout};
use crate::simulation::{SimConfig, Simulation};

/// Record both halves of a link, the way a finished negotiation does
fn establish_link(sim: &mut Simulation, a: DeviceId, b: DeviceId, kind: ProtocolKind) {
    sim.add_connection(a, kind, b);
    sim.add_connection(b, kind, a);
}

/// Two devices in mutual BLE range discover each other and negotiate a
/// link through the ordinary scan/handshake machinery.
pub fn run_pairing_scenario() -> Simulation {
    info!("=== pairing scenario ===");

    let mut sim = Simulation::with_positions(
        SimConfig {
            width: 100,
            height: 100,
            ..Default::default()
        },
        &[(10, 10), (13, 14)],
    );
    let (a, b) = (DeviceId(0), DeviceId(1));

    // stagger the scan phases so the peers are not busy scanning at the
    // moment the other's REQUEST arrives
    sim.device_mut(a).layout = Layout::Flood(FloodLayout::with_phase(300, 3));
    sim.device_mut(b).layout = Layout::Flood(FloodLayout::with_phase(300, 28));

    sim.run_ticks(60);

    println!("{}", sim.state_summary());
    println!(
        "  {} <-> {}: mutually connected = {}",
        sim.device(a).name,
        sim.device(b).name,
        sim.is_connected(a, b) && sim.is_connected(b, a)
    );
    if let Some(row) = sim.collector().latest() {
        println!("  reachability = {:.3}", row.reachability);
    }
    sim
}

/// Two devices far outside radio range never connect; the topology stays
/// two isolated components.
pub fn run_isolation_scenario() -> Simulation {
    info!("=== isolation scenario ===");

    let mut sim = Simulation::with_positions(
        SimConfig {
            width: 150,
            height: 150,
            ..Default::default()
        },
        &[(0, 0), (100, 100)],
    );
    sim.run_ticks(60);

    println!("{}", sim.state_summary());
    if let Some(row) = sim.collector().latest() {
        println!("  reachability = {:.3}", row.reachability);
    }
    sim
}

/// A line A - B - C where A cannot reach C directly: a packet from A is
/// flooded through B and arrives at C two hops later.
pub fn run_relay_scenario() -> Simulation {
    info!("=== relay scenario ===");

    let mut sim = Simulation::with_positions(
        SimConfig {
            width: 200,
            height: 200,
            ..Default::default()
        },
        &[(0, 100), (35, 100), (70, 100)],
    );
    let (a, b, c) = (DeviceId(0), DeviceId(1), DeviceId(2));

    // pre-establish the chain; the endpoints sit well inside BLE range,
    // so the per-tick purge leaves these records alone
    establish_link(&mut sim, a, b, ProtocolKind::Ble);
    establish_link(&mut sim, b, c, ProtocolKind::Ble);

    sim.send_packet_any_protocol(a, Packet::data(a, c, 5), c);
    sim.run_ticks(60);

    let delivered: usize = sim
        .device(c)
        .received_packets
        .values()
        .map(Vec::len)
        .sum();
    println!("{}", sim.state_summary());
    println!("  packets delivered to {}: {}", sim.device(c).name, delivered);
    if let Some(row) = sim.collector().latest() {
        println!("  average transit time = {:.2} hops", row.average_transit_time);
    }
    sim
}

/// Free-running simulation with a random population; prints the metric
/// trajectory tail when done.
pub fn run_free_scenario(config: SimConfig, ticks: u64) -> Simulation {
    info!(
        "=== free-running scenario: {} devices on {}x{} ===",
        config.n_agents, config.width, config.height
    );

    let mut sim = Simulation::new(config);
    sim.run_ticks(ticks);

    println!("{}", sim.state_summary());
    for row in sim.collector().rows().iter().rev().take(5).rev() {
        println!(
            "  tick {:>4}: reachability {:.3}, routing {:.3}, power {:.3}, fairness {:.3}, overall {:.3}",
            row.tick,
            row.reachability,
            row.routing_efficiency,
            row.power_efficiency,
            row.fairness,
            row.overall_evaluation
        );
    }
    sim
}
