//! Cooperative alarm scheduler and buffer pool.
//!
//! Models the contract the Zigbee stack offers its application:
//!
//! - **Alarms** - `(callback, payload)` pairs due at a time, cancellable by
//!   identity. Payload matching supports "any" like the stack does.
//! - **Deferred buffer requests** - a callback that runs as soon as a stack
//!   buffer is free, receiving that buffer.
//!
//! Nothing here runs on its own: the poll loop calls [`Scheduler::next_job`]
//! and dispatches each job to its component, one at a time.

pub mod alarm;
pub mod buffer;

pub use alarm::AlarmQueue;
pub use buffer::{BufId, BufferPool};

use heapless::Deque;

use crate::config::{ALARM_QUEUE_CAPACITY, BUFFER_POOL_SIZE, DEFERRED_QUEUE_CAPACITY};
use crate::error::Error;
use crate::time::{Duration, Instant};

/// Identity of a deferred entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Callback {
    /// Send the peer-finding query.
    FindPeer,
    /// No response to the query in time.
    FindPeerTimeout,
    /// Sample a held button; payload is the button role index.
    PollButton,
    /// Send an on/off command; payload is the on/off value.
    SendOnOff,
    /// Send a level step command; payload is the step mode.
    SendStep,
}

/// One unit of deferred work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Job {
    pub callback: Callback,
    pub param: u8,
    /// Buffer owned by this job, if any.
    pub buf: Option<BufId>,
}

impl Job {
    pub const fn new(callback: Callback, param: u8) -> Self {
        Self {
            callback,
            param,
            buf: None,
        }
    }

    pub const fn with_buf(mut self, buf: BufId) -> Self {
        self.buf = Some(buf);
        self
    }
}

/// Payload selector for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamMatch {
    Exact(u8),
    Any,
}

impl ParamMatch {
    pub fn matches(self, param: u8) -> bool {
        match self {
            ParamMatch::Exact(p) => p == param,
            ParamMatch::Any => true,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct BufferRequest {
    callback: Callback,
    param: u8,
}

pub struct Scheduler {
    alarms: AlarmQueue<ALARM_QUEUE_CAPACITY>,
    buffers: BufferPool<BUFFER_POOL_SIZE>,
    waiting: Deque<BufferRequest, DEFERRED_QUEUE_CAPACITY>,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            alarms: AlarmQueue::new(),
            buffers: BufferPool::new(),
            waiting: Deque::new(),
        }
    }

    /// Run `job` once `delay` has passed.
    ///
    /// On `QueueFull` a buffer carried by the job goes back to the pool.
    pub fn schedule_alarm(&mut self, job: Job, delay: Duration, now: Instant) -> Result<(), Error> {
        let result = self.alarms.schedule(job, now + delay);
        if result.is_err() {
            if let Some(buf) = job.buf {
                self.buffers.free(buf)?;
            }
        }
        result
    }

    /// Cancel alarms by identity. Buffers held by removed jobs are freed.
    pub fn cancel_alarm(&mut self, callback: Callback, param: ParamMatch) -> Result<(), Error> {
        let buffers = &mut self.buffers;
        let mut freed = Ok(());
        self.alarms.cancel(callback, param, |job| {
            if let Some(buf) = job.buf {
                freed = freed.and(buffers.free(buf));
            }
        })?;
        freed
    }

    /// Invoke `callback` with a fresh buffer as soon as one is available.
    pub fn get_out_delayed(&mut self, callback: Callback, param: u8) -> Result<(), Error> {
        self.waiting
            .push_back(BufferRequest { callback, param })
            .map_err(|_| Error::QueueFull)
    }

    pub fn alloc(&mut self) -> Option<BufId> {
        self.buffers.alloc()
    }

    pub fn free(&mut self, buf: BufId) -> Result<(), Error> {
        self.buffers.free(buf)
    }

    /// Next job ready at `now`: buffer waiters first (FIFO), then alarms.
    pub fn next_job(&mut self, now: Instant) -> Option<Job> {
        if !self.waiting.is_empty() {
            if let Some(buf) = self.buffers.alloc() {
                if let Some(req) = self.waiting.pop_front() {
                    return Some(Job::new(req.callback, req.param).with_buf(buf));
                }
            }
        }
        self.alarms.pop_due(now)
    }

    /// How long the poll loop may sleep before the next job is ready.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        if !self.waiting.is_empty() && self.buffers.available() > 0 {
            return Some(Duration::ZERO);
        }
        self.alarms.next_deadline(now)
    }

    pub fn is_pending(&self, callback: Callback, param: ParamMatch) -> bool {
        self.alarms.is_pending(callback, param)
            || self
                .waiting
                .iter()
                .any(|r| r.callback == callback && param.matches(r.param))
    }

    pub fn pending_alarms(&self) -> usize {
        self.alarms.len()
    }

    pub fn free_buffers(&self) -> usize {
        self.buffers.available()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
