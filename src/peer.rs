//! The single light bulb this switch controls.

/// Address of a resolved peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Peer {
    pub short_addr: u16,
    pub endpoint: u8,
}

/// Holds the peer once discovery has found it.
///
/// Resolution is first-write-wins: once set, later writes are ignored
/// until [`PeerHandle::reset`] starts a new discovery cycle.
#[derive(Debug, Default)]
pub struct PeerHandle {
    peer: Option<Peer>,
}

impl PeerHandle {
    pub const fn new() -> Self {
        Self { peer: None }
    }

    pub fn get(&self) -> Option<Peer> {
        self.peer
    }

    pub fn is_resolved(&self) -> bool {
        self.peer.is_some()
    }

    /// Record `peer` if nothing is recorded yet. Returns whether it was taken.
    pub fn resolve(&mut self, peer: Peer) -> bool {
        if self.peer.is_some() {
            return false;
        }
        self.peer = Some(peer);
        true
    }

    pub fn reset(&mut self) {
        self.peer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_resolution_wins() {
        let mut handle = PeerHandle::new();
        let first = Peer { short_addr: 0x1234, endpoint: 10 };
        let second = Peer { short_addr: 0x5678, endpoint: 11 };

        assert!(handle.resolve(first));
        assert!(!handle.resolve(second));
        assert_eq!(handle.get(), Some(first));

        handle.reset();
        assert!(!handle.is_resolved());
        assert!(handle.resolve(second));
        assert_eq!(handle.get(), Some(second));
    }
}
