//! Radio protocols
//!
//! A [`Protocol`] is a radio attached to exactly one device. Two devices
//! can share a link only if each owns a radio of the same
//! [`ProtocolKind`]; the kind set is closed, the simulator never loads
//! protocol plugins.
//!
//! All characteristic attributes are positive integers:
//!
//! - `scan_radius`: Euclidean discovery/link range in grid units
//! - `scan_cost`: energy charged when a scan fires
//! - `scan_duration`: ticks a scan occupies the device
//! - `connection_cost`: energy cost of keeping a link (characteristic only)
//! - `latency`: per-packet fixed delay in ticks
//! - `bandwidth`: size units transferred per tick

use serde::{Deserialize, Serialize};

/// The closed set of radio kinds devices can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProtocolKind {
    /// Bluetooth Low Energy
    Ble,
    /// Wi-Fi on the 2.4 GHz band
    Wifi24,
}

impl std::fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolKind::Ble => write!(f, "BLE"),
            ProtocolKind::Wifi24 => write!(f, "WiFi-2.4GHz"),
        }
    }
}

/// A radio instance owned by a single device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    pub kind: ProtocolKind,
    pub scan_radius: u32,
    pub scan_cost: u32,
    pub scan_duration: u32,
    pub connection_cost: u32,
    pub latency: u32,
    pub bandwidth: u32,
}

impl Protocol {
    /// Bluetooth Low Energy: short range, low bandwidth
    pub fn ble() -> Self {
        Self {
            kind: ProtocolKind::Ble,
            scan_radius: 50,
            scan_cost: 1,
            scan_duration: 10,
            connection_cost: 2,
            latency: 1,
            bandwidth: 10,
        }
    }

    /// Wi-Fi 2.4 GHz: same range as BLE, ten times the bandwidth
    ///
    /// Devices can only be EITHER access point OR client; AP-to-AP links
    /// are not modeled yet, so admissibility stays symmetric for now.
    pub fn wifi24() -> Self {
        Self {
            kind: ProtocolKind::Wifi24,
            scan_radius: 50,
            scan_cost: 1,
            scan_duration: 10,
            connection_cost: 2,
            latency: 1,
            bandwidth: 100,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let ble = Protocol::ble();
        assert_eq!(ble.kind, ProtocolKind::Ble);
        assert_eq!(ble.bandwidth, 10);

        let wifi = Protocol::wifi24();
        assert_eq!(wifi.kind, ProtocolKind::Wifi24);
        assert_eq!(wifi.bandwidth, 100);
        assert_eq!(wifi.scan_radius, ble.scan_radius);
    }
}
