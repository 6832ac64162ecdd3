//! Network stack lifecycle signals.
//!
//! The application only acts on successful reboot and steering signals
//! (the device is on the network, so the peer can be searched for).
//! Every signal is still handed to the stack's default handling.

/// Signal kinds as numbered by the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalKind {
    SkipStartup,
    DeviceAnnounce,
    Leave,
    Error,
    DeviceFirstStart,
    DeviceReboot,
    /// Network steering (joining) finished.
    Steering,
    CanSleep,
    Other(u16),
}

impl SignalKind {
    pub const fn code(self) -> u16 {
        match self {
            SignalKind::SkipStartup => 1,
            SignalKind::DeviceAnnounce => 2,
            SignalKind::Leave => 3,
            SignalKind::Error => 4,
            SignalKind::DeviceFirstStart => 5,
            SignalKind::DeviceReboot => 6,
            SignalKind::Steering => 10,
            SignalKind::CanSleep => 22,
            SignalKind::Other(code) => code,
        }
    }
}

impl From<u16> for SignalKind {
    fn from(code: u16) -> Self {
        match code {
            1 => SignalKind::SkipStartup,
            2 => SignalKind::DeviceAnnounce,
            3 => SignalKind::Leave,
            4 => SignalKind::Error,
            5 => SignalKind::DeviceFirstStart,
            6 => SignalKind::DeviceReboot,
            10 => SignalKind::Steering,
            22 => SignalKind::CanSleep,
            other => SignalKind::Other(other),
        }
    }
}

/// Stack return code attached to a signal; `0` is success.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(pub i32);

impl Status {
    pub const OK: Status = Status(0);

    pub fn is_ok(self) -> bool {
        self.0 == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Signal {
    pub kind: SignalKind,
    pub status: Status,
}

impl Signal {
    pub const fn new(kind: SignalKind, status: Status) -> Self {
        Self { kind, status }
    }

    /// The device is (back) on the network and may look for its peer.
    pub fn joined(&self) -> bool {
        matches!(self.kind, SignalKind::DeviceReboot | SignalKind::Steering) && self.status.is_ok()
    }

    /// New state of the network LED, if this signal changes it.
    pub fn network_led(&self) -> Option<bool> {
        match self.kind {
            SignalKind::DeviceFirstStart | SignalKind::DeviceReboot | SignalKind::Steering => {
                Some(self.status.is_ok())
            }
            SignalKind::Leave if self.status.is_ok() => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_successful_reboot_or_steering_counts_as_joined() {
        assert!(Signal::new(SignalKind::Steering, Status::OK).joined());
        assert!(Signal::new(SignalKind::DeviceReboot, Status::OK).joined());
        assert!(!Signal::new(SignalKind::Steering, Status(-1)).joined());
        assert!(!Signal::new(SignalKind::DeviceFirstStart, Status::OK).joined());
        assert!(!Signal::new(SignalKind::Leave, Status::OK).joined());
    }

    #[test]
    fn network_led_follows_join_and_leave() {
        assert_eq!(Signal::new(SignalKind::Steering, Status::OK).network_led(), Some(true));
        assert_eq!(Signal::new(SignalKind::DeviceReboot, Status(-1)).network_led(), Some(false));
        assert_eq!(Signal::new(SignalKind::Leave, Status::OK).network_led(), Some(false));
        assert_eq!(Signal::new(SignalKind::CanSleep, Status::OK).network_led(), None);
    }

    #[test]
    fn codes_round_trip_including_unknown() {
        for kind in [SignalKind::Steering, SignalKind::Leave, SignalKind::Other(42)] {
            assert_eq!(SignalKind::from(kind.code()), kind);
        }
    }
}
