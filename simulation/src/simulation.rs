//! Simulation engine
//!
//! Owns the device arena, the grid, the PRNG and the tick counter, and
//! implements everything that crosses device boundaries: packet
//! dispatch, connection bookkeeping and the per-tick driver.
//!
//! One tick proceeds to completion before the next begins. Devices are
//! visited in a random order drawn from the model's PRNG; within a
//! device the layout hook, routing hook, active task, stale-link purge
//! and optional move run in that fixed order. `send_packet_immediate`
//! delivers synchronously, so a device's `on_packet` can re-enter within
//! the same tick.

use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, trace, warn};

use radiomesh_core::{
    DeviceId, HandshakePhase, MeshError, MeshResult, Packet, Protocol, ProtocolKind,
};

use crate::collector::DataCollector;
use crate::device::{Device, MICROBIT_SCAN_INTERVAL};
use crate::grid::{Cell, Grid};
use crate::tasks::{HandshakeTask, ScanTask, SendPacketTask, Task, TaskState};

/// Chance per tick that a device wanders to an adjacent cell
const MOVE_PROBABILITY: f64 = 0.1;

/// Configuration for the simulation
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of devices in the population
    pub n_agents: usize,
    /// Grid width in cells
    pub width: u32,
    /// Grid height in cells
    pub height: u32,
    /// PRNG seed; a fixed seed reproduces the full run
    pub seed: u64,
    /// Ticks between scan rounds of the flood layout
    pub scan_interval: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            n_agents: 7,
            width: 10,
            height: 10,
            seed: 42,
            scan_interval: MICROBIT_SCAN_INTERVAL,
        }
    }
}

/// The simulation state
#[derive(Debug)]
pub struct Simulation {
    devices: Vec<Device>,
    grid: Grid,
    rng: StdRng,
    tick: u64,
    collector: DataCollector,
}

impl Simulation {
    /// Create a simulation with devices placed at uniformly random cells
    pub fn new(config: SimConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut grid = Grid::new(config.width, config.height);
        let mut devices = Vec::with_capacity(config.n_agents);

        for i in 0..config.n_agents {
            let id = DeviceId(i as u32);
            let device = Device::microbit(id, config.scan_interval, &mut rng);
            let cell = (
                rng.random_range(0..config.width),
                rng.random_range(0..config.height),
            );
            grid.place_agent(id, cell);
            devices.push(device);
        }

        let collector = DataCollector::new();
        info!("simulation initialized with {} devices", devices.len());
        Self {
            devices,
            grid,
            rng,
            tick: 0,
            collector,
        }
    }

    /// Create a simulation with devices at explicit cells (one device per
    /// entry); used by scenarios and tests
    pub fn with_positions(config: SimConfig, cells: &[Cell]) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut grid = Grid::new(config.width, config.height);
        let mut devices = Vec::with_capacity(cells.len());

        for (i, cell) in cells.iter().enumerate() {
            let id = DeviceId(i as u32);
            devices.push(Device::microbit(id, config.scan_interval, &mut rng));
            grid.place_agent(id, *cell);
        }

        let collector = DataCollector::new();
        Self {
            devices,
            grid,
            rng,
            tick: 0,
            collector,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn device_ids(&self) -> Vec<DeviceId> {
        (0..self.devices.len() as u32).map(DeviceId).collect()
    }

    pub fn device(&self, id: DeviceId) -> &Device {
        &self.devices[id.index()]
    }

    pub(crate) fn device_mut(&mut self, id: DeviceId) -> &mut Device {
        &mut self.devices[id.index()]
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn collector(&self) -> &DataCollector {
        &self.collector
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Move a device to an explicit cell, bypassing random movement
    pub fn place_device(&mut self, id: DeviceId, cell: Cell) {
        self.grid.place_agent(id, cell);
    }

    /// Run a single simulation tick
    pub fn step(&mut self) {
        trace!("=== tick {} ===", self.tick);
        let row = DataCollector::measure(self);
        self.collector.push(row);

        let mut order = self.device_ids();
        order.shuffle(&mut self.rng);
        for id in order {
            self.step_device(id);
        }
        self.tick += 1;
    }

    /// Run for a specific number of ticks
    pub fn run_ticks(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// One device's share of the current tick
    fn step_device(&mut self, id: DeviceId) {
        trace!("stepping {}", self.device(id).name);

        self.layout_step(id);
        let routing = self.device(id).routing;
        routing.step(self, id);

        // drain finished tasks from the head of the queue
        while let Some(task) = self.device(id).tasks.front() {
            if task.status() == TaskState::Pending {
                break;
            }
            self.device_mut(id).tasks.pop_front();
        }

        if let Some(mut task) = self.device_mut(id).tasks.pop_front() {
            debug!("{}: active task: {}", self.device(id).name, task);
            task.step(self, id);
            if task.status() == TaskState::Pending {
                self.device_mut(id).tasks.push_front(task);
            }
        } else {
            trace!("no tasks for {}", self.device(id).name);
        }

        self.drop_stale_connections(id);
        self.maybe_move(id);
    }

    fn layout_step(&mut self, id: DeviceId) {
        use crate::layout::Layout;

        let device = &mut self.devices[id.index()];
        let scan_due = match &mut device.layout {
            Layout::Flood(flood) => flood.advance(),
        };
        if scan_due {
            for proto in device.protocols.clone() {
                device.tasks.push_back(Task::Scan(ScanTask::new(proto)));
            }
        }
    }

    /// A scan hit; dispatched to the device's layout algorithm
    pub(crate) fn device_discovered(&mut self, id: DeviceId, proto: Protocol, peer: DeviceId) {
        use crate::layout::Layout;

        // one negotiation per peer at a time, whatever the layout wants
        if self.device(id).has_handshake_for(peer) {
            return;
        }
        let task = match self.device(id).layout {
            // the flood layout handshakes anything it sees
            Layout::Flood(_) => Task::Handshake(HandshakeTask::client(peer, proto)),
        };
        debug!("{} discovered {}", self.device(id).name, peer);
        self.device_mut(id).tasks.push_back(task);
    }

    /// Drop every connection whose admissibility no longer holds
    fn drop_stale_connections(&mut self, id: DeviceId) {
        let records: Vec<_> = self.device(id).connections.iter().copied().collect();
        for (kind, peer) in records {
            let alive = self
                .device(id)
                .protocol_of_kind(kind)
                .is_some_and(|p| self.can_connect(id, &p, peer));
            if !alive {
                trace!("{} dropping stale connection to {}", self.device(id).name, peer);
                self.device_mut(id).connections.remove(&(kind, peer));
            }
        }
    }

    fn maybe_move(&mut self, id: DeviceId) {
        if self.rng.random::<f64>() >= MOVE_PROBABILITY {
            return;
        }
        let Some(pos) = self.grid.position(id) else {
            return;
        };
        let cells = self.grid.neighborhood(pos);
        if let Some(cell) = cells.choose(&mut self.rng).copied() {
            self.grid.move_agent(id, cell);
        }
    }

    /// Whether `proto` admits a link from `device` to `peer`: the peer
    /// owns a radio of the same kind and sits within scan radius.
    pub fn can_connect(&self, device: DeviceId, proto: &Protocol, peer: DeviceId) -> bool {
        if !self.device(peer).owns_kind(proto.kind) {
            return false;
        }
        let (Some(a), Some(b)) = (self.grid.position(device), self.grid.position(peer)) else {
            return false;
        };
        Grid::distance2(a, b) <= (proto.scan_radius as u64).pow(2)
    }

    /// Admissibility-checked connection; callers are expected to check
    /// `can_connect` first.
    pub fn connect(&mut self, device: DeviceId, peer: DeviceId, proto: &Protocol) -> MeshResult<()> {
        trace!("{} connecting to {} over {}", self.device(device).name, peer, proto);
        if !self.device(device).protocols.contains(proto) {
            return Err(MeshError::ProtocolNotAttached {
                device,
                kind: proto.kind,
            });
        }
        if !self.can_connect(device, proto, peer) {
            return Err(MeshError::InvalidConnection {
                local: device,
                peer,
                kind: proto.kind,
            });
        }
        self.add_connection(device, proto.kind, peer);
        Ok(())
    }

    /// Record this side's half of a link
    pub(crate) fn add_connection(&mut self, device: DeviceId, kind: ProtocolKind, peer: DeviceId) {
        self.device_mut(device).connections.insert((kind, peer));
    }

    pub fn is_connected(&self, device: DeviceId, peer: DeviceId) -> bool {
        self.device(device).is_connected(peer)
    }

    pub(crate) fn has_connection(
        &self,
        device: DeviceId,
        kind: ProtocolKind,
        peer: DeviceId,
    ) -> bool {
        self.device(device).connections.contains(&(kind, peer))
    }

    /// The protocol of this device's first connection record to `dest`
    pub(crate) fn connection_protocol(&self, device: DeviceId, dest: DeviceId) -> Option<Protocol> {
        let d = self.device(device);
        d.connections
            .iter()
            .find(|(_, peer)| *peer == dest)
            .and_then(|(kind, _)| d.protocol_of_kind(*kind))
    }

    /// Append a task to the tail of a device's queue
    pub fn queue_task(&mut self, device: DeviceId, task: Task) {
        trace!(
            "{}: queuing task: {} ({} already queued)",
            self.device(device).name,
            task,
            self.device(device).tasks.len()
        );
        self.device_mut(device).tasks.push_back(task);
    }

    /// Enqueue a transfer of `packet` to `dest`; with no protocol given,
    /// an existing connection to `dest` supplies one.
    pub fn send_packet(
        &mut self,
        device: DeviceId,
        proto: Option<Protocol>,
        packet: Packet,
        dest: DeviceId,
    ) {
        trace!("{}: queueing {}", self.device(device).name, packet);
        let proto = proto.or_else(|| self.connection_protocol(device, dest));
        let Some(proto) = proto else {
            warn!(
                "{} has neither a protocol nor a connection for {}; packet dropped",
                self.device(device).name,
                dest
            );
            return;
        };
        self.queue_task(device, Task::SendPacket(SendPacketTask::new(dest, proto, packet)));
    }

    /// Send over an existing link if there is one, otherwise let the
    /// routing algorithm find a way.
    pub fn send_packet_any_protocol(&mut self, device: DeviceId, packet: Packet, dest: DeviceId) {
        if let Some(proto) = self.connection_protocol(device, dest) {
            debug!(
                "{} sending packet to {} using existing connection",
                self.device(device).name,
                dest
            );
            self.queue_task(device, Task::SendPacket(SendPacketTask::new(dest, proto, packet)));
        } else {
            debug!(
                "{} sending packet to {} using routing algorithm",
                self.device(device).name,
                dest
            );
            self.route(device, device, None, packet);
        }
    }

    /// Deliver a packet synchronously, bypassing the task queue
    ///
    /// The destination's `on_packet` runs before this returns.
    pub fn send_packet_immediate(
        &mut self,
        device: DeviceId,
        proto: Protocol,
        packet: Packet,
        dest: DeviceId,
    ) {
        trace!("{}: sending {}", self.device(device).name, packet);
        let size = packet.size_estimate as u64;
        let sender = self.device_mut(device);
        if packet.source == device {
            sender.own_data += size;
        }
        sender.total_data += size;
        self.on_packet(dest, device, proto, packet);
    }

    /// Inbound packet dispatch
    pub fn on_packet(
        &mut self,
        device: DeviceId,
        sender: DeviceId,
        proto: Protocol,
        packet: Packet,
    ) {
        if !self.device(device).owns_kind(proto.kind) {
            error!(
                "{} received packet from {} over unsupported protocol {}",
                self.device(device).name,
                self.device(sender).name,
                proto
            );
            return;
        }
        if packet.destination != device {
            self.route(device, sender, Some(proto), packet);
            return;
        }
        trace!("{} received {} from {}", self.device(device).name, packet, sender);

        // the active task gets the first look
        if let Some(mut task) = self.device_mut(device).tasks.pop_front() {
            let consumed = task.on_packet(self, device, sender, &packet);
            self.device_mut(device).tasks.push_front(task);
            if consumed {
                return;
            }
        }

        // an unsolicited REQUEST opens the server side of a negotiation,
        // unless one with this peer already exists
        if packet.handshake_phase() == Some(HandshakePhase::Request) {
            if self.device(device).has_handshake_for(sender) {
                return;
            }
            let mut task = HandshakeTask::server(sender, proto);
            task.on_packet(self, device, sender, &packet);
            self.device_mut(device).tasks.push_back(Task::Handshake(task));
            return;
        }

        let tick = self.tick;
        self.device_mut(device)
            .received_packets
            .entry(tick)
            .or_default()
            .push(packet);
    }

    /// Hand a packet to the device's routing algorithm
    pub(crate) fn route(
        &mut self,
        device: DeviceId,
        sender: DeviceId,
        proto: Option<Protocol>,
        packet: Packet,
    ) {
        let routing = self.device(device).routing;
        routing.route(self, device, sender, proto, packet);
    }

    /// Count of established links (matching records on both sides)
    pub fn established_link_count(&self) -> usize {
        let mut count = 0;
        for device in &self.devices {
            for peer in device.established_neighbors() {
                if device.id < peer && self.device(peer).is_connected(device.id) {
                    count += 1;
                }
            }
        }
        count
    }

    /// One-line summary of the current state
    pub fn state_summary(&self) -> String {
        let queued: usize = self.devices.iter().map(|d| d.tasks.len()).sum();
        format!(
            "tick {}: {} devices, {} established links, {} queued tasks",
            self.tick,
            self.devices.len(),
            self.established_link_count(),
            queued
        )
    }
}
