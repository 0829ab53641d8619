//! Tasks: discrete units of pending work on a device
//!
//! A task advances one step per tick while it sits at the head of its
//! device's queue. The variant set is closed:
//!
//! - [`ScanTask`]: counts down a scan window, then reports every device
//!   in radio range to the layout algorithm
//! - [`HandshakeTask`]: the REQUEST -> RESPONSE -> ESTABLISH link
//!   negotiation, client or server side
//! - [`SendPacketTask`]: models transfer time over an established link
//!
//! Handshake and send-packet tasks encode what would naturally be async
//! I/O as explicit state machines driven one tick at a time; the tick is
//! the scheduling primitive.

use tracing::{debug, info, trace};

use radiomesh_core::{DeviceId, HandshakePhase, Packet, Protocol};

use crate::simulation::Simulation;

/// Ticks a link negotiation may take before giving up
pub const HANDSHAKE_TIMEOUT: i32 = 5;

/// Lifecycle of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Completed,
    Failed,
}

/// The closed set of task variants
#[derive(Debug, Clone)]
pub enum Task {
    Scan(ScanTask),
    Handshake(HandshakeTask),
    SendPacket(SendPacketTask),
}

impl Task {
    pub fn status(&self) -> TaskState {
        match self {
            Task::Scan(t) => t.status,
            Task::Handshake(t) => t.status,
            Task::SendPacket(t) => t.status,
        }
    }

    /// Advance the task by one tick
    pub(crate) fn step(&mut self, sim: &mut Simulation, device: DeviceId) {
        match self {
            Task::Scan(t) => t.step(sim, device),
            Task::Handshake(t) => t.step(sim, device),
            Task::SendPacket(t) => t.step(sim, device),
        }
    }

    /// Offer an incoming packet to the task; true means it was consumed.
    pub(crate) fn on_packet(
        &mut self,
        sim: &mut Simulation,
        device: DeviceId,
        sender: DeviceId,
        packet: &Packet,
    ) -> bool {
        match self {
            // scans and transfers do not consume packets
            Task::Scan(_) | Task::SendPacket(_) => false,
            Task::Handshake(t) => t.on_packet(sim, device, sender, packet),
        }
    }

    /// The peer a handshake task negotiates with, if this is one
    pub fn handshake_peer(&self) -> Option<DeviceId> {
        match self {
            Task::Handshake(t) => Some(t.peer),
            _ => None,
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Task::Scan(t) => write!(f, "scan over {}", t.proto),
            Task::Handshake(t) => write!(f, "handshake with {}", t.peer),
            Task::SendPacket(t) => write!(f, "send packet to {}", t.dest),
        }
    }
}

/// Listen for `scan_duration` ticks, then report everything in range
#[derive(Debug, Clone)]
pub struct ScanTask {
    proto: Protocol,
    remaining: u32,
    status: TaskState,
}

impl ScanTask {
    pub fn new(proto: Protocol) -> Self {
        Self {
            proto,
            remaining: proto.scan_duration,
            status: TaskState::Pending,
        }
    }

    fn step(&mut self, sim: &mut Simulation, device: DeviceId) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return;
        }

        sim.device_mut(device).consumed_energy += self.proto.scan_cost as u64;
        let hits = match sim.grid().position(device) {
            Some(center) => sim.grid().neighbors_within(center, self.proto.scan_radius),
            None => Vec::new(),
        };
        for hit in hits {
            if hit != device {
                sim.device_discovered(device, self.proto, hit);
            }
        }
        self.status = TaskState::Completed;
    }
}

/// Sub-states of a link negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandshakeState {
    SendRequest,
    WaitResponse,
    SendEstablish,
    WaitRequest,
    SendResponse,
    WaitEstablish,
}

/// Three-way link negotiation with a single peer
///
/// The client walks SEND_REQUEST -> WAIT_RESPONSE -> SEND_ESTABLISH; the
/// server mirrors it with WAIT_REQUEST -> SEND_RESPONSE -> WAIT_ESTABLISH.
/// Sends bypass the task queue so the exchange fits in a few ticks. The
/// task fails once the timeout is spent, or when the device is already
/// connected to the peer (a duplicate negotiation); the layout algorithm
/// re-seeds on its next cycle.
#[derive(Debug, Clone)]
pub struct HandshakeTask {
    pub peer: DeviceId,
    proto: Protocol,
    state: HandshakeState,
    timeout: i32,
    status: TaskState,
}

impl HandshakeTask {
    /// Initiator side
    pub fn client(peer: DeviceId, proto: Protocol) -> Self {
        Self {
            peer,
            proto,
            state: HandshakeState::SendRequest,
            timeout: HANDSHAKE_TIMEOUT,
            status: TaskState::Pending,
        }
    }

    /// Responder side, created on an unsolicited REQUEST
    pub fn server(peer: DeviceId, proto: Protocol) -> Self {
        Self {
            state: HandshakeState::WaitRequest,
            ..Self::client(peer, proto)
        }
    }

    pub(crate) fn on_packet(
        &mut self,
        sim: &mut Simulation,
        device: DeviceId,
        sender: DeviceId,
        packet: &Packet,
    ) -> bool {
        let Some(phase) = packet.handshake_phase() else {
            return false;
        };
        if sender != self.peer {
            return false;
        }
        match (self.state, phase) {
            (HandshakeState::WaitRequest, HandshakePhase::Request) => {
                self.state = HandshakeState::SendResponse;
                true
            }
            (HandshakeState::WaitResponse, HandshakePhase::Response) => {
                self.state = HandshakeState::SendEstablish;
                true
            }
            (HandshakeState::WaitEstablish, HandshakePhase::Establish) => {
                self.status = TaskState::Completed;
                sim.add_connection(device, self.proto.kind, self.peer);
                true
            }
            _ => false,
        }
    }

    fn step(&mut self, sim: &mut Simulation, device: DeviceId) {
        if self.status == TaskState::Completed {
            return;
        }
        if self.timeout <= 0 || sim.device(device).is_connected(self.peer) {
            debug!(
                "handshake between {} and {} abandoned",
                sim.device(device).name,
                self.peer
            );
            self.status = TaskState::Failed;
            return;
        }

        match self.state {
            HandshakeState::SendRequest => {
                sim.send_packet_immediate(
                    device,
                    self.proto,
                    Packet::handshake(device, self.peer, HandshakePhase::Request),
                    self.peer,
                );
                self.state = HandshakeState::WaitResponse;
            }
            HandshakeState::SendResponse => {
                sim.send_packet_immediate(
                    device,
                    self.proto,
                    Packet::handshake(device, self.peer, HandshakePhase::Response),
                    self.peer,
                );
                self.state = HandshakeState::WaitEstablish;
            }
            HandshakeState::SendEstablish => {
                sim.send_packet_immediate(
                    device,
                    self.proto,
                    Packet::handshake(device, self.peer, HandshakePhase::Establish),
                    self.peer,
                );
                sim.add_connection(device, self.proto.kind, self.peer);
                info!(
                    "handshake completed between {} and {}",
                    sim.device(device).name,
                    self.peer
                );
                self.status = TaskState::Completed;
            }
            // wait states only move on incoming packets
            _ => {}
        }
        self.timeout -= 1;
    }
}

/// Deliver a packet over an established link after a bandwidth delay
///
/// The connection must survive for the whole transfer; if it drops, the
/// packet is handed back to the routing algorithm instead of erroring.
#[derive(Debug, Clone)]
pub struct SendPacketTask {
    dest: DeviceId,
    proto: Protocol,
    packet: Packet,
    delay: u32,
    status: TaskState,
}

impl SendPacketTask {
    pub fn new(dest: DeviceId, proto: Protocol, packet: Packet) -> Self {
        let delay = packet.size_estimate / proto.bandwidth + 1 + proto.latency;
        Self {
            dest,
            proto,
            packet,
            delay,
            status: TaskState::Pending,
        }
    }

    fn step(&mut self, sim: &mut Simulation, device: DeviceId) {
        self.delay = self.delay.saturating_sub(1);

        if !sim.has_connection(device, self.proto.kind, self.dest) {
            trace!(
                "{} lost {} mid-transfer, re-routing packet",
                sim.device(device).name,
                self.dest
            );
            sim.route(device, device, Some(self.proto), self.packet.clone());
            self.status = TaskState::Completed;
            return;
        }

        if self.delay == 0 {
            sim.send_packet_immediate(device, self.proto, self.packet.clone(), self.dest);
            debug!(
                "{} sent packet of size {} to {}",
                sim.device(device).name,
                self.packet.size_estimate,
                self.dest
            );
            self.status = TaskState::Completed;
        }
    }
}
