//! Seams between the application logic and the platform.
//!
//! The firmware implements these against the GPIO and the stack link;
//! tests implement them with recording fakes.

use crate::peer::Peer;
use crate::signal::Signal;
use crate::ui::{ButtonRole, Led};
use crate::zcl::{MatchDescReq, OnOff, StepCommand};

/// Outbound requests to the Zigbee stack. All of them are fire-and-forget.
pub trait Network {
    /// Broadcast a match descriptor query.
    fn match_desc_req(&mut self, req: &MatchDescReq);

    fn send_on_off(&mut self, peer: Peer, cmd: OnOff);

    fn send_step(&mut self, peer: Peer, step: StepCommand);

    /// Tell the stack the user touched the device (sleepy devices poll their parent).
    fn user_input_indicate(&mut self);

    /// Hand a signal to the stack's own default handling.
    fn default_signal_handler(&mut self, signal: Signal);
}

/// Polled button level.
pub trait ButtonInput {
    fn is_pressed(&self, role: ButtonRole) -> bool;
}

/// Board LEDs.
pub trait Indicators {
    fn set(&mut self, led: Led, on: bool);
}
