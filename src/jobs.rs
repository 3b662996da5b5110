//! Background work for single-owner state.
//!
//! Jobs run on short-lived threads and report back over a channel. Their
//! results are applied only when the owner drains the channel, so all state
//! changes happen on the owning thread.

use std::{
    sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError, channel},
    thread,
    time::{Duration, Instant},
};

/// Identifies a dispatched request and the session it was issued under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct JobTag {
    pub(crate) request_id: u64,
    pub(crate) session_generation: u64,
}

pub(crate) struct BackgroundJobs<M> {
    message_tx: Sender<M>,
    message_rx: Receiver<M>,
    in_flight: usize,
}

impl<M: Send + 'static> BackgroundJobs<M> {
    pub(crate) fn new() -> Self {
        let (message_tx, message_rx) = channel();
        Self {
            message_tx,
            message_rx,
            in_flight: 0,
        }
    }

    pub(crate) fn spawn<F>(&mut self, job: F)
    where
        F: FnOnce() -> M + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.message_tx.clone();
        thread::spawn(move || {
            let _ = tx.send(job());
        });
    }

    pub(crate) fn try_recv(&mut self) -> Option<M> {
        match self.message_rx.try_recv() {
            Ok(message) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(message)
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block until a message arrives or `deadline` passes.
    pub(crate) fn recv_until(&mut self, deadline: Instant) -> Option<M> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining == Duration::ZERO {
            return self.try_recv();
        }
        match self.message_rx.recv_timeout(remaining) {
            Ok(message) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(message)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Jobs spawned whose messages have not been received yet.
    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight
    }
}

/// Tracks the newest request of one kind so older answers can be dropped.
#[derive(Debug, Default)]
pub(crate) struct LatestRequest {
    issued: u64,
    pending: Option<u64>,
}

impl LatestRequest {
    /// Issue a new request id; it supersedes all earlier ones.
    pub(crate) fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.pending = Some(self.issued);
        self.issued
    }

    /// Accept an answer if it belongs to the newest request.
    pub(crate) fn settle(&mut self, request_id: u64) -> bool {
        if request_id != self.issued {
            return false;
        }
        self.pending = None;
        true
    }

    /// Forget any pending request; its answer will be ignored.
    pub(crate) fn abandon(&mut self) {
        if self.pending.is_some() {
            self.issued += 1;
            self.pending = None;
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_newest_request_settles() {
        let mut latest = LatestRequest::default();
        let first = latest.issue();
        let second = latest.issue();
        assert!(latest.is_pending());
        assert!(!latest.settle(first));
        assert!(latest.is_pending());
        assert!(latest.settle(second));
        assert!(!latest.is_pending());
    }

    #[test]
    fn abandoned_request_is_never_accepted() {
        let mut latest = LatestRequest::default();
        let id = latest.issue();
        latest.abandon();
        assert!(!latest.is_pending());
        assert!(!latest.settle(id));
    }

    #[test]
    fn spawned_jobs_report_back() {
        let mut jobs = BackgroundJobs::new();
        jobs.spawn(|| 7u32);
        jobs.spawn(|| 9u32);
        assert_eq!(jobs.in_flight(), 2);
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut seen = vec![
            jobs.recv_until(deadline).unwrap(),
            jobs.recv_until(deadline).unwrap(),
        ];
        seen.sort();
        assert_eq!(seen, vec![7, 9]);
        assert_eq!(jobs.in_flight(), 0);
        assert!(jobs.try_recv().is_none());
    }
}
