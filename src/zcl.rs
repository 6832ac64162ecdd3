//! Zigbee identifiers and the command payloads this switch sends.
//!
//! Only the logical content of each request lives here; framing on the
//! air is the stack's business.

use heapless::Vec;

/// Home Automation application profile.
pub const HA_PROFILE_ID: u16 = 0x0104;

/// On/Off cluster.
pub const CLUSTER_ON_OFF: u16 = 0x0006;

/// Level Control cluster.
pub const CLUSTER_LEVEL_CONTROL: u16 = 0x0008;

/// Broadcast to every device with its receiver on when idle (non-sleepy).
pub const BROADCAST_RX_ON_WHEN_IDLE: u16 = 0xFFFD;

/// Short address meaning "no device".
pub const UNRESOLVED_ADDR: u16 = 0xFFFF;

/// ZDP status code for success.
pub const ZDP_STATUS_SUCCESS: u8 = 0x00;

/// Maximum clusters in one match descriptor list.
pub const MAX_MATCH_CLUSTERS: usize = 4;

/// Maximum endpoints kept from a match descriptor response.
pub const MAX_MATCH_ENDPOINTS: usize = 8;

/// Requested state of the light.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OnOff {
    Off,
    On,
}

impl OnOff {
    /// ZCL On/Off cluster command id.
    pub const fn command_id(self) -> u8 {
        match self {
            OnOff::Off => 0x00,
            OnOff::On => 0x01,
        }
    }

    pub const fn from_param(param: u8) -> Self {
        if param != 0 {
            OnOff::On
        } else {
            OnOff::Off
        }
    }

    pub const fn as_param(self) -> u8 {
        self.command_id()
    }
}

/// Direction of a level step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepMode {
    Up,
    Down,
}

impl StepMode {
    /// Step mode field of the Level Control "step" command.
    pub const fn code(self) -> u8 {
        match self {
            StepMode::Up => 0x00,
            StepMode::Down => 0x01,
        }
    }

    pub const fn from_param(param: u8) -> Self {
        if param == 0x01 {
            StepMode::Down
        } else {
            StepMode::Up
        }
    }

    pub const fn as_param(self) -> u8 {
        self.code()
    }
}

/// Level Control "step" command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepCommand {
    pub mode: StepMode,
    /// Level change (level range 0x00..=0xFE).
    pub step_size: u8,
    /// Transition time in 0.1 s units.
    pub transition_time: u16,
}

impl StepCommand {
    /// A dimming step with the configured size and transition time.
    pub const fn dimm(mode: StepMode) -> Self {
        Self {
            mode,
            step_size: crate::config::DIMM_STEP,
            transition_time: crate::config::DIMM_TRANSITION_TIME,
        }
    }
}

/// ZDO Match Descriptor request.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MatchDescReq {
    /// Destination of the request.
    pub nwk_addr: u16,
    /// Devices whose descriptors should be matched.
    pub addr_of_interest: u16,
    pub profile_id: u16,
    pub in_clusters: Vec<u16, MAX_MATCH_CLUSTERS>,
    pub out_clusters: Vec<u16, MAX_MATCH_CLUSTERS>,
}

impl MatchDescReq {
    /// Query for a dimmable light: On/Off and Level Control servers on a
    /// non-sleepy HA device.
    pub fn dimmable_light() -> Self {
        let mut in_clusters = Vec::new();
        // Capacity is larger than the two clusters pushed here.
        let _ = in_clusters.push(CLUSTER_ON_OFF);
        let _ = in_clusters.push(CLUSTER_LEVEL_CONTROL);
        Self {
            nwk_addr: BROADCAST_RX_ON_WHEN_IDLE,
            addr_of_interest: BROADCAST_RX_ON_WHEN_IDLE,
            profile_id: HA_PROFILE_ID,
            in_clusters,
            out_clusters: Vec::new(),
        }
    }
}

/// ZDO Match Descriptor response, as delivered by the stack.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MatchDescResp {
    pub status: u8,
    /// Short address of the responding device.
    pub src_addr: u16,
    /// Endpoints on that device that matched the query.
    pub endpoints: Vec<u8, MAX_MATCH_ENDPOINTS>,
}

impl MatchDescResp {
    pub fn is_success(&self) -> bool {
        self.status == ZDP_STATUS_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimmable_light_query_targets_non_sleepy_devices() {
        let req = MatchDescReq::dimmable_light();
        assert_eq!(req.nwk_addr, 0xFFFD);
        assert_eq!(req.addr_of_interest, 0xFFFD);
        assert_eq!(req.profile_id, 0x0104);
        assert_eq!(req.in_clusters.as_slice(), &[0x0006, 0x0008]);
        assert!(req.out_clusters.is_empty());
    }

    #[test]
    fn command_codes() {
        assert_eq!(OnOff::On.command_id(), 0x01);
        assert_eq!(OnOff::Off.command_id(), 0x00);
        assert_eq!(StepMode::Up.code(), 0x00);
        assert_eq!(StepMode::Down.code(), 0x01);
        assert_eq!(OnOff::from_param(OnOff::On.as_param()), OnOff::On);
        assert_eq!(StepMode::from_param(StepMode::Down.as_param()), StepMode::Down);
    }

    #[test]
    fn dimm_step_uses_configured_size() {
        let step = StepCommand::dimm(StepMode::Up);
        assert_eq!(step.step_size, 15);
        assert_eq!(step.transition_time, 2);
    }
}
