//! Bounded queue of pending alarms.

use heapless::Vec;

use super::{Callback, Job, ParamMatch};
use crate::error::Error;
use crate::time::{Duration, Instant};

/// A job waiting for its due time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Alarm {
    pub job: Job,
    pub due: Instant,
    /// Registration order, breaks ties between alarms due together.
    seq: u32,
}

pub struct AlarmQueue<const N: usize> {
    alarms: Vec<Alarm, N>,
    next_seq: u32,
}

impl<const N: usize> AlarmQueue<N> {
    pub const fn new() -> Self {
        Self {
            alarms: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn schedule(&mut self, job: Job, due: Instant) -> Result<(), Error> {
        let alarm = Alarm {
            job,
            due,
            seq: self.next_seq,
        };
        self.alarms.push(alarm).map_err(|_| Error::QueueFull)?;
        self.next_seq = self.next_seq.wrapping_add(1);
        Ok(())
    }

    /// Remove every alarm for `callback` whose payload matches.
    ///
    /// Removed jobs are handed to `on_removed` so owned buffers can be freed.
    pub fn cancel(
        &mut self,
        callback: Callback,
        param: ParamMatch,
        mut on_removed: impl FnMut(Job),
    ) -> Result<(), Error> {
        let before = self.alarms.len();
        let mut i = 0;
        while i < self.alarms.len() {
            let job = self.alarms[i].job;
            if job.callback == callback && param.matches(job.param) {
                self.alarms.swap_remove(i);
                on_removed(job);
            } else {
                i += 1;
            }
        }
        if self.alarms.len() == before {
            Err(Error::NotFound)
        } else {
            Ok(())
        }
    }

    /// Pop the most overdue alarm; equal due times come out in registration order.
    pub fn pop_due(&mut self, now: Instant) -> Option<Job> {
        let (index, _) = self
            .alarms
            .iter()
            .enumerate()
            .filter(|(_, a)| a.due.is_reached(now))
            .min_by_key(|(_, a)| (a.due.remaining_from(now), a.seq.wrapping_sub(self.next_seq)))?;
        Some(self.alarms.swap_remove(index).job)
    }

    /// Time until the earliest alarm is due (zero if one is overdue).
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.alarms
            .iter()
            .map(|a| a.due.remaining_from(now).max(0) as u32)
            .min()
            .map(Duration::from_millis)
    }

    pub fn is_pending(&self, callback: Callback, param: ParamMatch) -> bool {
        self.alarms
            .iter()
            .any(|a| a.job.callback == callback && param.matches(a.job.param))
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }
}

impl<const N: usize> Default for AlarmQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u32) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn pops_in_due_order() {
        let mut q: AlarmQueue<4> = AlarmQueue::new();
        q.schedule(Job::new(Callback::FindPeerTimeout, 0), at(500)).unwrap();
        q.schedule(Job::new(Callback::PollButton, 1), at(100)).unwrap();

        assert_eq!(q.pop_due(at(50)), None);
        assert_eq!(q.pop_due(at(600)).map(|j| j.callback), Some(Callback::PollButton));
        assert_eq!(q.pop_due(at(600)).map(|j| j.callback), Some(Callback::FindPeerTimeout));
        assert!(q.is_empty());
    }

    #[test]
    fn same_tick_alarms_keep_registration_order() {
        let mut q: AlarmQueue<4> = AlarmQueue::new();
        q.schedule(Job::new(Callback::PollButton, 0), at(100)).unwrap();
        q.schedule(Job::new(Callback::FindPeerTimeout, 0), at(100)).unwrap();
        q.schedule(Job::new(Callback::PollButton, 1), at(100)).unwrap();

        let order: [Option<Job>; 3] = [q.pop_due(at(100)), q.pop_due(at(100)), q.pop_due(at(100))];
        assert_eq!(order[0], Some(Job::new(Callback::PollButton, 0)));
        assert_eq!(order[1], Some(Job::new(Callback::FindPeerTimeout, 0)));
        assert_eq!(order[2], Some(Job::new(Callback::PollButton, 1)));
    }

    #[test]
    fn full_queue_rejects_schedule() {
        let mut q: AlarmQueue<1> = AlarmQueue::new();
        q.schedule(Job::new(Callback::PollButton, 0), at(10)).unwrap();
        assert_eq!(
            q.schedule(Job::new(Callback::PollButton, 1), at(10)),
            Err(Error::QueueFull)
        );
    }

    #[test]
    fn cancel_matches_callback_and_payload() {
        let mut q: AlarmQueue<4> = AlarmQueue::new();
        q.schedule(Job::new(Callback::PollButton, 0), at(10)).unwrap();
        q.schedule(Job::new(Callback::PollButton, 1), at(10)).unwrap();

        let mut removed = 0;
        q.cancel(Callback::PollButton, ParamMatch::Exact(1), |_| removed += 1)
            .unwrap();
        assert_eq!(removed, 1);
        assert!(q.is_pending(Callback::PollButton, ParamMatch::Exact(0)));
        assert!(!q.is_pending(Callback::PollButton, ParamMatch::Exact(1)));
    }

    #[test]
    fn cancel_any_removes_all_and_reports_miss() {
        let mut q: AlarmQueue<4> = AlarmQueue::new();
        q.schedule(Job::new(Callback::FindPeerTimeout, 0), at(10)).unwrap();
        q.schedule(Job::new(Callback::FindPeerTimeout, 3), at(20)).unwrap();

        q.cancel(Callback::FindPeerTimeout, ParamMatch::Any, |_| {}).unwrap();
        assert!(q.is_empty());
        assert_eq!(
            q.cancel(Callback::FindPeerTimeout, ParamMatch::Any, |_| {}),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn next_deadline_reports_earliest() {
        let mut q: AlarmQueue<4> = AlarmQueue::new();
        assert_eq!(q.next_deadline(at(0)), None);
        q.schedule(Job::new(Callback::FindPeer, 0), at(2000)).unwrap();
        q.schedule(Job::new(Callback::FindPeerTimeout, 0), at(5000)).unwrap();
        assert_eq!(q.next_deadline(at(500)), Some(Duration::from_millis(1500)));
        assert_eq!(q.next_deadline(at(2500)), Some(Duration::ZERO));
    }
}
