//! The light switch application.
//!
//! Ties the discovery engine and the button controller to the scheduler
//! and the platform seams. Every entry point runs to completion; the
//! firmware calls them from a single poll loop:
//!
//! 1. Stack signals and responses -> [`LightSwitch::on_indication`].
//! 2. Button edges -> [`LightSwitch::on_button_event`].
//! 3. Then [`LightSwitch::run_pending`] until nothing is ready, and sleep
//!    for [`LightSwitch::next_deadline`] or until the next event.
//!
//! An `Err` from any of these is a scheduler fault the device cannot
//! recover from.

use crate::discovery::Discovery;
use crate::error::Error;
use crate::link::Indication;
use crate::peer::Peer;
use crate::sched::{Callback, Job, Scheduler};
use crate::signal::Signal;
use crate::time::{Duration, Instant};
use crate::traits::{ButtonInput, Indicators, Network};
use crate::ui::buttons::ButtonController;
use crate::ui::{ButtonRole, Led};
use crate::zcl::{MatchDescResp, OnOff, StepCommand, StepMode};

pub struct LightSwitch<N, B, L> {
    net: N,
    input: B,
    leds: L,
    sched: Scheduler,
    discovery: Discovery,
    buttons: ButtonController,
}

impl<N, B, L> LightSwitch<N, B, L>
where
    N: Network,
    B: ButtonInput,
    L: Indicators,
{
    /// Fresh application: no peer, nothing scheduled.
    pub fn new(net: N, input: B, leds: L) -> Self {
        Self {
            net,
            input,
            leds,
            sched: Scheduler::new(),
            discovery: Discovery::new(),
            buttons: ButtonController::new(),
        }
    }

    /// The light bulb being controlled, once discovery has found one.
    pub fn peer(&self) -> Option<Peer> {
        self.discovery.peer()
    }

    /// Discovery engine state.
    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// Per-button session state.
    pub fn buttons(&self) -> &ButtonController {
        &self.buttons
    }

    /// Pending alarms, waiters and buffers.
    pub fn scheduler(&self) -> &Scheduler {
        &self.sched
    }

    /// The stack link.
    pub fn network(&self) -> &N {
        &self.net
    }

    /// Mutable access to the stack link.
    pub fn network_mut(&mut self) -> &mut N {
        &mut self.net
    }

    /// Mutable access to the button level source.
    pub fn input_mut(&mut self) -> &mut B {
        &mut self.input
    }

    /// The board LEDs.
    pub fn indicators(&self) -> &L {
        &self.leds
    }

    /// Frame decoded from the stack link.
    pub fn on_indication(&mut self, ind: &Indication, now: Instant) -> Result<(), Error> {
        match ind {
            Indication::Signal(signal) => self.on_signal(*signal, now),
            Indication::MatchDescResp(resp) => {
                self.on_match_desc_resp(resp);
                Ok(())
            }
        }
    }

    /// Stack lifecycle signal.
    pub fn on_signal(&mut self, signal: Signal, now: Instant) -> Result<(), Error> {
        if let Some(on) = signal.network_led() {
            self.leds.set(Led::Network, on);
        }
        self.net.default_signal_handler(signal);

        if signal.joined() && !self.discovery.is_resolved() {
            info!("Joined network ({}), looking for a light bulb", signal.kind);
            self.discovery.arm(&mut self.sched, now)?;
        }
        Ok(())
    }

    pub fn on_match_desc_resp(&mut self, resp: &MatchDescResp) -> bool {
        self.discovery
            .on_match_desc_resp(&mut self.sched, &mut self.leds, resp)
    }

    /// Press edge from board key `key`.
    pub fn on_button_event(&mut self, key: u8, now: Instant) -> Result<(), Error> {
        self.net.user_input_indicate();

        let Some(role) = ButtonRole::from_key(key) else {
            info!("Unhandled button event: {}", key);
            return Ok(());
        };
        let peer_known = self.discovery.is_resolved();
        self.buttons.on_press(role, peer_known, &mut self.sched, now)?;
        Ok(())
    }

    /// Run every job that is ready at `now`. Returns how many ran.
    pub fn run_pending(&mut self, now: Instant) -> Result<usize, Error> {
        let mut ran = 0;
        while let Some(job) = self.sched.next_job(now) {
            self.dispatch(job, now)?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Time until the next job is due, if any is queued.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.sched.next_deadline(now)
    }

    fn dispatch(&mut self, job: Job, now: Instant) -> Result<(), Error> {
        match job.callback {
            Callback::FindPeer => self.discovery.find_peer(&mut self.sched, &mut self.net, job.buf),
            Callback::FindPeerTimeout => self.discovery.on_timeout(&mut self.sched, job.buf, now),
            Callback::PollButton => {
                let Some(role) = ButtonRole::from_key(job.param) else {
                    return Ok(());
                };
                let pressed = self.input.is_pressed(role);
                self.buttons.poll(role, pressed, &mut self.sched, now)?;
                Ok(())
            }
            Callback::SendOnOff => self.send(job, |net, peer, param| {
                let cmd = OnOff::from_param(param);
                info!("Send ON/OFF command: {}", cmd);
                net.send_on_off(peer, cmd);
            }),
            Callback::SendStep => self.send(job, |net, peer, param| {
                let step = StepCommand::dimm(StepMode::from_param(param));
                info!("Send step level command: {}", step.mode);
                net.send_step(peer, step);
            }),
        }
    }

    /// Deliver a command job to the peer and release its buffer.
    fn send(&mut self, job: Job, emit: impl FnOnce(&mut N, Peer, u8)) -> Result<(), Error> {
        if let Some(peer) = self.discovery.peer() {
            emit(&mut self.net, peer, job.param);
        } else {
            warn!("Command dropped, no peer");
        }
        match job.buf {
            Some(buf) => self.sched.free(buf),
            None => Ok(()),
        }
    }
}
