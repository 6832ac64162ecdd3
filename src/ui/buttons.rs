//! Button press-duration state machine.
//!
//! Per role:
//!
//! ```text
//! Idle --edge--> ShortWindow --released before threshold--> Idle (toggle)
//!                     |
//!                held past threshold
//!                     v
//!                 LongRepeat --held--> LongRepeat (step, next poll after long interval)
//!                     |
//!                  released --> Idle (no trailing toggle)
//! ```
//!
//! A press is sampled by polling: the edge starts a session and schedules
//! the first poll, each poll decides from the elapsed time and the current
//! level what to send and when to look again. Commands go out through the
//! deferred-buffer queue, so a slow buffer never delays the next poll.

use crate::config::{BUTTON_LONG_POLL, BUTTON_SHORT_POLL, BUTTON_THRESHOLD};
use crate::error::Error;
use crate::sched::{Callback, Job, Scheduler};
use crate::time::{Duration, Instant};
use crate::ui::ButtonRole;

/// One press-to-release interaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonSession {
    pub active: bool,
    pub pressed_at: Instant,
}

/// What a poll decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// No session for this role.
    Inactive,
    /// Released before the threshold; toggle requested.
    Toggled,
    /// Released after the threshold; nothing sent.
    Released,
    /// Held past the threshold; step requested.
    Stepped,
    /// Still inside the short window.
    Waiting,
    /// The next poll could not be scheduled; session abandoned.
    Abandoned,
}

#[derive(Debug, Default)]
pub struct ButtonController {
    sessions: [ButtonSession; ButtonRole::COUNT],
}

impl ButtonController {
    pub const fn new() -> Self {
        const IDLE: ButtonSession = ButtonSession {
            active: false,
            pressed_at: Instant::from_millis(0),
        };
        Self {
            sessions: [IDLE; ButtonRole::COUNT],
        }
    }

    pub fn session(&self, role: ButtonRole) -> ButtonSession {
        self.sessions[role.index()]
    }

    /// Press edge. Ignored without a peer or while a session is running.
    ///
    /// Returns `true` if a new session started.
    pub fn on_press(
        &mut self,
        role: ButtonRole,
        peer_known: bool,
        sched: &mut Scheduler,
        now: Instant,
    ) -> Result<bool, Error> {
        if !peer_known {
            debug!("No peer found yet, {} ignored", role);
            return Ok(false);
        }
        let session = &mut self.sessions[role.index()];
        if session.active {
            return Ok(false);
        }
        *session = ButtonSession {
            active: true,
            pressed_at: now,
        };
        self.schedule_poll(role, BUTTON_SHORT_POLL, sched, now)
    }

    /// Poll job for `role`; `pressed` is the current button level.
    pub fn poll(
        &mut self,
        role: ButtonRole,
        pressed: bool,
        sched: &mut Scheduler,
        now: Instant,
    ) -> Result<PollOutcome, Error> {
        let session = &mut self.sessions[role.index()];
        if !session.active {
            return Ok(PollOutcome::Inactive);
        }
        let short_expired = now.duration_since(session.pressed_at) > BUTTON_THRESHOLD;

        if !pressed {
            session.active = false;
            if short_expired {
                return Ok(PollOutcome::Released);
            }
            sched.get_out_delayed(Callback::SendOnOff, role.on_off().as_param())?;
            return Ok(PollOutcome::Toggled);
        }

        if short_expired {
            sched.get_out_delayed(Callback::SendStep, role.step_mode().as_param())?;
            let outcome = if self.schedule_poll(role, BUTTON_LONG_POLL, sched, now)? {
                PollOutcome::Stepped
            } else {
                PollOutcome::Abandoned
            };
            return Ok(outcome);
        }

        if self.schedule_poll(role, BUTTON_SHORT_POLL, sched, now)? {
            Ok(PollOutcome::Waiting)
        } else {
            Ok(PollOutcome::Abandoned)
        }
    }

    /// Schedule the next poll; a full alarm queue abandons the session.
    fn schedule_poll(
        &mut self,
        role: ButtonRole,
        delay: Duration,
        sched: &mut Scheduler,
        now: Instant,
    ) -> Result<bool, Error> {
        let job = Job::new(Callback::PollButton, role.key());
        match sched.schedule_alarm(job, delay, now) {
            Ok(()) => Ok(true),
            Err(e) if e.is_resource_exhaustion() => {
                warn!("Can not schedule another alarm, queue is full.");
                self.sessions[role.index()].active = false;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
