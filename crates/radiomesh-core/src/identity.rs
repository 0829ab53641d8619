//! Device identities
//!
//! Devices live in an arena owned by the model. A [`DeviceId`] is the
//! stable index of a device in that arena; connection records, packet
//! endpoints and task targets all carry ids, never owning references.

use serde::{Deserialize, Serialize};

/// Unique identifier for a device (arena index in the model)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub u32);

impl DeviceId {
    /// The arena slot this id points at
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for DeviceId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "device {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_index() {
        let id = DeviceId(3);
        assert_eq!(id.to_string(), "device 3");
        assert_eq!(id.index(), 3);
    }
}
