//! Layout algorithms: how a device grows the topology
//!
//! A layout algorithm periodically seeds the scan/handshake machinery.
//! The set of variants is closed; the flood variant connects to
//! everything it discovers, with no admission control.

use rand::Rng;

/// The closed set of layout algorithms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Flood(FloodLayout),
}

/// Scan on a fixed interval and handshake every device discovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloodLayout {
    /// Ticks between scan rounds
    pub scan_interval: u32,
    next_scan: u32,
}

impl FloodLayout {
    /// The first scan fires after a random offset so a whole population
    /// does not scan in lockstep.
    pub fn new(scan_interval: u32, rng: &mut impl Rng) -> Self {
        Self::with_phase(scan_interval, rng.random_range(0..=scan_interval))
    }

    /// A layout whose first scan fires after an explicit delay
    pub fn with_phase(scan_interval: u32, first_scan_in: u32) -> Self {
        Self {
            scan_interval,
            next_scan: first_scan_in,
        }
    }

    /// Advance the countdown by one tick; true means a scan round is due.
    pub(crate) fn advance(&mut self) -> bool {
        if self.next_scan == 0 {
            self.next_scan = self.scan_interval;
            true
        } else {
            self.next_scan -= 1;
            false
        }
    }
}
