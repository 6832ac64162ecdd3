//! Peer discovery - finds a light bulb to control.
//!
//! After the device joins the network a Match Descriptor query for the
//! On/Off and Level Control clusters is broadcast to non-sleepy devices.
//! The first successful response names the peer. Without one, the query
//! is repeated forever: each timeout schedules the next query after the
//! start delay and re-arms itself.
//!
//! Both the query and the timeout need a stack buffer. Fired without one
//! they park themselves on the scheduler's deferred-buffer queue and run
//! again once a buffer is free.

use crate::config::{FIND_PEER_START_DELAY, FIND_PEER_TIMEOUT};
use crate::error::Error;
use crate::peer::{Peer, PeerHandle};
use crate::sched::{BufId, Callback, Job, ParamMatch, Scheduler};
use crate::time::Instant;
use crate::traits::{Indicators, Network};
use crate::ui::Led;
use crate::zcl::{MatchDescReq, MatchDescResp, UNRESOLVED_ADDR};

pub struct Discovery {
    peer: PeerHandle,
    /// A query/timeout cycle is running.
    armed: bool,
    queries_sent: u32,
}

impl Discovery {
    pub const fn new() -> Self {
        Self {
            peer: PeerHandle::new(),
            armed: false,
            queries_sent: 0,
        }
    }

    pub fn peer(&self) -> Option<Peer> {
        self.peer.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.peer.is_resolved()
    }

    pub fn queries_sent(&self) -> u32 {
        self.queries_sent
    }

    /// Start the query/timeout cycle after joining the network.
    ///
    /// Does nothing if the peer is known or a cycle is already running.
    pub fn arm(&mut self, sched: &mut Scheduler, now: Instant) -> Result<(), Error> {
        if self.peer.is_resolved() || self.armed {
            return Ok(());
        }
        sched.schedule_alarm(Job::new(Callback::FindPeer, 0), FIND_PEER_START_DELAY, now)?;
        sched.schedule_alarm(Job::new(Callback::FindPeerTimeout, 0), FIND_PEER_TIMEOUT, now)?;
        self.armed = true;
        Ok(())
    }

    /// Send the query. Runs from the `FindPeer` job.
    pub fn find_peer<N: Network>(
        &mut self,
        sched: &mut Scheduler,
        net: &mut N,
        buf: Option<BufId>,
    ) -> Result<(), Error> {
        if self.peer.is_resolved() {
            debug!("Find peer: already resolved, query skipped");
            return release(sched, buf);
        }
        let Some(buf) = buf else {
            return sched.get_out_delayed(Callback::FindPeer, 0);
        };

        // Only a response to this query may resolve the peer.
        self.peer.reset();
        net.match_desc_req(&MatchDescReq::dimmable_light());
        self.queries_sent = self.queries_sent.wrapping_add(1);
        info!("Find peer: query {} sent", self.queries_sent);
        sched.free(buf)
    }

    /// Handle a Match Descriptor response. Returns `true` if it resolved the peer.
    ///
    /// Failed, empty or late responses are ignored; the cycle continues.
    pub fn on_match_desc_resp<L: Indicators>(
        &mut self,
        sched: &mut Scheduler,
        leds: &mut L,
        resp: &MatchDescResp,
    ) -> bool {
        if !resp.is_success() || resp.src_addr == UNRESOLVED_ADDR {
            return false;
        }
        // Only one matching endpoint is expected; extra ones are ignored.
        let Some(&endpoint) = resp.endpoints.first() else {
            return false;
        };
        let peer = Peer {
            short_addr: resp.src_addr,
            endpoint,
        };
        if !self.peer.resolve(peer) {
            return false;
        }
        info!("Found peer addr: {} ep: {}", peer.short_addr, peer.endpoint);
        self.armed = false;

        if let Err(e) = sched.cancel_alarm(Callback::FindPeerTimeout, ParamMatch::Any) {
            warn!("Find peer timeout not cancelled: {}", e);
        }
        leds.set(Led::PeerFound, true);
        true
    }

    /// No response within the timeout. Runs from the `FindPeerTimeout` job.
    pub fn on_timeout(
        &mut self,
        sched: &mut Scheduler,
        buf: Option<BufId>,
        now: Instant,
    ) -> Result<(), Error> {
        if self.peer.is_resolved() {
            return release(sched, buf);
        }
        let Some(buf) = buf else {
            return sched.get_out_delayed(Callback::FindPeerTimeout, 0);
        };

        info!("Peer not found, try again");
        sched.schedule_alarm(
            Job::new(Callback::FindPeer, 0).with_buf(buf),
            FIND_PEER_START_DELAY,
            now,
        )?;
        sched.schedule_alarm(Job::new(Callback::FindPeerTimeout, 0), FIND_PEER_TIMEOUT, now)
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}

fn release(sched: &mut Scheduler, buf: Option<BufId>) -> Result<(), Error> {
    match buf {
        Some(buf) => sched.free(buf),
        None => Ok(()),
    }
}
