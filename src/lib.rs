//! Zigbee dimmer switch - application logic.
//!
//! Everything that does not touch hardware lives in this library so it
//! can be tested on the host (no embedded hardware required):
//!
//! - peer discovery with an endless query/timeout retry loop
//! - the button press-duration state machine (toggle vs. dimming steps)
//! - the alarm scheduler and buffer pool both of them run on
//! - the framed link to the Zigbee co-processor
//!
//! Usage: `cargo test` (host) or `cargo build --release --features embedded`
//! for the nRF52840 firmware in `main.rs`.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod app;
pub mod config;
pub mod discovery;
pub mod error;
pub mod link;
pub mod peer;
pub mod sched;
pub mod signal;
pub mod time;
pub mod traits;
pub mod ui;
pub mod zcl;

pub use app::LightSwitch;
pub use error::{Error, LinkError};
