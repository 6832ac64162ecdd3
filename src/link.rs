//! Framed UART link to the Zigbee network co-processor.
//!
//! The Zigbee stack runs on a co-processor; this side sends it requests
//! and receives signals and ZDO responses back.
//!
//! Frame format:
//! ```text
//! START (1)   0xAA
//! LENGTH (1)  payload length
//! TYPE (1)    frame type
//! PAYLOAD     type-specific, multi-byte fields little-endian
//! CHECKSUM(1) XOR of LENGTH, TYPE and every payload byte
//! ```

use heapless::Vec;

use crate::config::{StackConfig, LIGHT_SWITCH_ENDPOINT};
use crate::error::LinkError;
use crate::peer::Peer;
use crate::signal::{Signal, SignalKind, Status};
use crate::zcl::{
    MatchDescReq, MatchDescResp, OnOff, StepCommand, HA_PROFILE_ID, MAX_MATCH_CLUSTERS,
    MAX_MATCH_ENDPOINTS,
};

/// Frame synchronization byte.
pub const FRAME_START: u8 = 0xAA;

/// Maximum payload size in bytes.
pub const MAX_PAYLOAD_SIZE: usize = 32;

/// Maximum complete frame size (START + LENGTH + TYPE + payload + CHECKSUM).
pub const MAX_FRAME_SIZE: usize = MAX_PAYLOAD_SIZE + 4;

mod frame_type {
    pub const START: u8 = 0x01;
    pub const MATCH_DESC_REQ: u8 = 0x02;
    pub const ON_OFF: u8 = 0x03;
    pub const STEP: u8 = 0x04;
    pub const USER_INPUT: u8 = 0x05;
    pub const DEFAULT_SIGNAL: u8 = 0x06;
    pub const SIGNAL: u8 = 0x81;
    pub const MATCH_DESC_RESP: u8 = 0x82;
}

/// Requests from the application to the stack.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Start the stack as an end device.
    Start(StackConfig),
    MatchDesc(MatchDescReq),
    OnOff { peer: Peer, cmd: OnOff },
    Step { peer: Peer, step: StepCommand },
    UserInput,
    /// Run the stack's default handling for a signal.
    DefaultSignal(Signal),
}

/// Notifications from the stack to the application.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indication {
    Signal(Signal),
    MatchDescResp(MatchDescResp),
}

type Payload = Vec<u8, MAX_PAYLOAD_SIZE>;

fn put(payload: &mut Payload, bytes: &[u8]) -> Result<(), LinkError> {
    payload
        .extend_from_slice(bytes)
        .map_err(|_| LinkError::PayloadTooLarge)
}

fn put_peer(payload: &mut Payload, peer: Peer) -> Result<(), LinkError> {
    put(payload, &peer.short_addr.to_le_bytes())?;
    put(payload, &[peer.endpoint, LIGHT_SWITCH_ENDPOINT])?;
    put(payload, &HA_PROFILE_ID.to_le_bytes())
}

fn put_clusters(payload: &mut Payload, clusters: &[u16]) -> Result<(), LinkError> {
    put(payload, &[clusters.len() as u8])?;
    for cluster in clusters {
        put(payload, &cluster.to_le_bytes())?;
    }
    Ok(())
}

fn checksum(length: u8, frame_type: u8, payload: &[u8]) -> u8 {
    payload.iter().fold(length ^ frame_type, |acc, b| acc ^ b)
}

fn write_frame(frame_type: u8, payload: &[u8], buf: &mut [u8]) -> Result<usize, LinkError> {
    let len = payload.len() + 4;
    if buf.len() < len {
        return Err(LinkError::BufferTooSmall);
    }
    let length = payload.len() as u8;
    buf[0] = FRAME_START;
    buf[1] = length;
    buf[2] = frame_type;
    buf[3..3 + payload.len()].copy_from_slice(payload);
    buf[3 + payload.len()] = checksum(length, frame_type, payload);
    Ok(len)
}

impl Request {
    fn frame_type(&self) -> u8 {
        match self {
            Request::Start(_) => frame_type::START,
            Request::MatchDesc(_) => frame_type::MATCH_DESC_REQ,
            Request::OnOff { .. } => frame_type::ON_OFF,
            Request::Step { .. } => frame_type::STEP,
            Request::UserInput => frame_type::USER_INPUT,
            Request::DefaultSignal(_) => frame_type::DEFAULT_SIGNAL,
        }
    }

    fn payload(&self) -> Result<Payload, LinkError> {
        let mut p = Payload::new();
        match self {
            Request::Start(cfg) => {
                put(&mut p, &cfg.channel_mask.to_le_bytes())?;
                put(
                    &mut p,
                    &[
                        cfg.rx_on_when_idle as u8,
                        cfg.ed_timeout,
                        cfg.erase_persistent_config as u8,
                    ],
                )?;
                put(&mut p, &cfg.keepalive_ms.to_le_bytes())?;
            }
            Request::MatchDesc(req) => {
                put(&mut p, &req.nwk_addr.to_le_bytes())?;
                put(&mut p, &req.addr_of_interest.to_le_bytes())?;
                put(&mut p, &req.profile_id.to_le_bytes())?;
                put_clusters(&mut p, &req.in_clusters)?;
                put_clusters(&mut p, &req.out_clusters)?;
            }
            Request::OnOff { peer, cmd } => {
                put_peer(&mut p, *peer)?;
                put(&mut p, &[cmd.command_id()])?;
            }
            Request::Step { peer, step } => {
                put_peer(&mut p, *peer)?;
                put(&mut p, &[step.mode.code(), step.step_size])?;
                put(&mut p, &step.transition_time.to_le_bytes())?;
            }
            Request::UserInput => {}
            Request::DefaultSignal(signal) => {
                put(&mut p, &signal.kind.code().to_le_bytes())?;
                put(&mut p, &signal.status.0.to_le_bytes())?;
            }
        }
        Ok(p)
    }

    /// Encode into `buf`, returning the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let payload = self.payload()?;
        write_frame(self.frame_type(), &payload, buf)
    }
}

fn u16_at(data: &[u8], at: usize) -> Result<u16, LinkError> {
    data.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(LinkError::Malformed)
}

impl Indication {
    /// Decode a checked frame payload.
    pub fn decode(frame_type: u8, payload: &[u8]) -> Result<Self, LinkError> {
        match frame_type {
            frame_type::SIGNAL => {
                if payload.len() != 6 {
                    return Err(LinkError::Malformed);
                }
                let kind = SignalKind::from(u16_at(payload, 0)?);
                let status = i32::from_le_bytes([payload[2], payload[3], payload[4], payload[5]]);
                Ok(Indication::Signal(Signal::new(kind, Status(status))))
            }
            frame_type::MATCH_DESC_RESP => {
                if payload.len() < 4 {
                    return Err(LinkError::Malformed);
                }
                let status = payload[0];
                let src_addr = u16_at(payload, 1)?;
                let count = payload[3] as usize;
                let eps = payload.get(4..4 + count).ok_or(LinkError::Malformed)?;
                let mut endpoints: Vec<u8, MAX_MATCH_ENDPOINTS> = Vec::new();
                // Endpoints past our capacity are dropped; only the first is used.
                for &ep in eps.iter().take(MAX_MATCH_ENDPOINTS) {
                    let _ = endpoints.push(ep);
                }
                Ok(Indication::MatchDescResp(MatchDescResp {
                    status,
                    src_addr,
                    endpoints,
                }))
            }
            other => Err(LinkError::UnknownType(other)),
        }
    }

    /// Encode into `buf`. Used by the co-processor side and by tests.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let mut p = Payload::new();
        let frame_type = match self {
            Indication::Signal(signal) => {
                put(&mut p, &signal.kind.code().to_le_bytes())?;
                put(&mut p, &signal.status.0.to_le_bytes())?;
                frame_type::SIGNAL
            }
            Indication::MatchDescResp(resp) => {
                put(&mut p, &[resp.status])?;
                put(&mut p, &resp.src_addr.to_le_bytes())?;
                put(&mut p, &[resp.endpoints.len() as u8])?;
                put(&mut p, &resp.endpoints)?;
                frame_type::MATCH_DESC_RESP
            }
        };
        write_frame(frame_type, &p, buf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    WaitingForStart,
    WaitingForLength,
    WaitingForType,
    ReadingPayload,
    WaitingForChecksum,
}

/// Byte-at-a-time decoder for inbound frames.
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    payload: Payload,
    expected_length: u8,
    frame_type: u8,
}

impl FrameParser {
    pub const fn new() -> Self {
        Self {
            state: ParseState::WaitingForStart,
            payload: Vec::new(),
            expected_length: 0,
            frame_type: 0,
        }
    }

    /// Feed one byte; yields a result once a whole frame has arrived.
    ///
    /// After an error the parser resynchronises on the next start byte.
    pub fn push(&mut self, byte: u8) -> Option<Result<Indication, LinkError>> {
        match self.state {
            ParseState::WaitingForStart => {
                if byte == FRAME_START {
                    self.state = ParseState::WaitingForLength;
                }
                None
            }
            ParseState::WaitingForLength => {
                if byte as usize > MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Some(Err(LinkError::PayloadTooLarge));
                }
                self.expected_length = byte;
                self.state = ParseState::WaitingForType;
                None
            }
            ParseState::WaitingForType => {
                self.frame_type = byte;
                self.payload.clear();
                self.state = if self.expected_length == 0 {
                    ParseState::WaitingForChecksum
                } else {
                    ParseState::ReadingPayload
                };
                None
            }
            ParseState::ReadingPayload => {
                // Length was checked against capacity above.
                let _ = self.payload.push(byte);
                if self.payload.len() == self.expected_length as usize {
                    self.state = ParseState::WaitingForChecksum;
                }
                None
            }
            ParseState::WaitingForChecksum => {
                let expected = checksum(self.expected_length, self.frame_type, &self.payload);
                let result = if byte == expected {
                    Indication::decode(self.frame_type, &self.payload)
                } else {
                    Err(LinkError::InvalidChecksum)
                };
                self.reset();
                Some(result)
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForStart;
        self.payload.clear();
        self.expected_length = 0;
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

// Capacity check: the largest request payload must fit a frame.
const _: () = assert!(6 + 2 * (1 + 2 * MAX_MATCH_CLUSTERS) <= MAX_PAYLOAD_SIZE);
