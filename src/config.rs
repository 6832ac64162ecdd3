//! Application-wide constants and compile-time configuration.
//!
//! All timing parameters, pin/LED role assignments and Zigbee
//! end-device settings live here so they can be tuned in one place.
//! Times are in milliseconds unless noted otherwise.

use crate::time::Duration;

// Zigbee network

/// The only channel scanned when looking for the coordinator.
pub const ZIGBEE_CHANNEL: u8 = 11;

/// IEEE 802.15.4 channel mask built from [`ZIGBEE_CHANNEL`].
pub const IEEE_CHANNEL_MASK: u32 = 1 << ZIGBEE_CHANNEL;

/// Source endpoint used to control the light bulb.
pub const LIGHT_SWITCH_ENDPOINT: u8 = 1;

/// End-device aging timeout code understood by the stack (64 minutes).
pub const ED_AGING_TIMEOUT_64MIN: u8 = 6;

/// Keepalive period towards the parent router.
pub const KEEPALIVE_TIMEOUT_MS: u32 = 3000;

/// Keep the network credentials across reboots.
pub const ERASE_PERSISTENT_CONFIG: bool = false;

// Peer discovery

/// Delay between the join notification (or a timeout) and the next query.
pub const FIND_PEER_START_DELAY: Duration = Duration::from_millis(2000);

/// How long one query waits for a matching response.
pub const FIND_PEER_TIMEOUT: Duration = Duration::from_millis(5000);

// Buttons and dimming

/// How long a button must be held before it counts as a long press.
pub const BUTTON_THRESHOLD: Duration = Duration::from_millis(1000);

/// Poll period while waiting for the threshold to elapse.
pub const BUTTON_SHORT_POLL: Duration = Duration::from_millis(50);

/// Poll period while held; one step command is sent per tick.
pub const BUTTON_LONG_POLL: Duration = Duration::from_millis(300);

/// Level change per step command (level range is 0x00..=0xFE).
pub const DIMM_STEP: u8 = 15;

/// Transition time of a single step, in 0.1 s units.
pub const DIMM_TRANSITION_TIME: u16 = 2;

/// Button debounce time used by the board layer.
pub const BUTTON_DEBOUNCE_MS: u64 = 20;

// Board
//
// nRF52840-DK defaults (LEDs and buttons are active-low):
//
//   LED 0 (startup blink) -> P0.13     Button 0 (ON)     -> P0.11
//   LED 1 (unused)        -> P0.14     Button 1 (OFF)    -> P0.12
//   LED 2 (network state) -> P0.15     Button 2 (sleepy) -> P0.24
//   LED 3 (peer found)    -> P0.16     Link UART RX/TX   -> P0.08 / P0.06

/// Number of board LEDs.
pub const LED_COUNT: usize = 4;

/// Number of board buttons watched for edges.
pub const BUTTON_COUNT: usize = 3;

/// Button sampled at boot; held means run as a sleepy end device.
pub const SLEEPY_ON_BUTTON: u8 = 2;

/// Number of LED toggles in the startup blink.
pub const STARTUP_BLINK_COUNT: usize = 50;

/// Half-period of the startup blink.
pub const STARTUP_BLINK_MS: u64 = 50;

// Scheduler resources

/// Maximum number of outstanding alarms.
pub const ALARM_QUEUE_CAPACITY: usize = 16;

/// Number of stack buffers available for outgoing requests.
pub const BUFFER_POOL_SIZE: usize = 4;

/// Maximum number of callbacks waiting for a free buffer.
pub const DEFERRED_QUEUE_CAPACITY: usize = 8;

/// Settings handed to the Zigbee stack when it is started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StackConfig {
    pub channel_mask: u32,
    /// `false` makes this a sleepy end device.
    pub rx_on_when_idle: bool,
    pub ed_timeout: u8,
    pub keepalive_ms: u32,
    pub erase_persistent_config: bool,
}

impl StackConfig {
    /// End-device settings; `sleepy` follows the strap button sampled at boot.
    pub const fn end_device(sleepy: bool) -> Self {
        Self {
            channel_mask: IEEE_CHANNEL_MASK,
            rx_on_when_idle: !sleepy,
            ed_timeout: ED_AGING_TIMEOUT_64MIN,
            keepalive_ms: KEEPALIVE_TIMEOUT_MS,
            erase_persistent_config: ERASE_PERSISTENT_CONFIG,
        }
    }
}
