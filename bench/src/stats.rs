//! Run accounting shared by all simulated clients

use crate::error::FailureStep;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Shared accumulator handed to every client task.
///
/// Each client records at most one success, after its close frame went out.
/// The counters are independent and read only after every task has been
/// joined; `active` and `peak_active` are updated together and stay `SeqCst`.
#[derive(Debug, Default)]
pub struct Tally {
    succeeded: AtomicU64,
    messages_sent: AtomicU64,
    bytes_sent: AtomicU64,
    messages_received: AtomicU64,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one event written to the wire with a payload of `bytes`
    pub fn record_sent(&self, bytes: usize) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark a client script as running until the guard drops
    pub fn enter(&self) -> ActiveGuard<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);
        ActiveGuard { tally: self }
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }

    /// Snapshot the counters into a summary
    pub fn summarize(
        &self,
        clients: usize,
        failures: Vec<ClientFailure>,
        elapsed: Duration,
    ) -> RunSummary {
        RunSummary {
            clients,
            succeeded: self.succeeded(),
            failures,
            messages_sent: self.messages_sent(),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            peak_concurrency: self.peak_active(),
            elapsed,
        }
    }
}

pub struct ActiveGuard<'a> {
    tally: &'a Tally,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.tally.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A client that did not finish its script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFailure {
    pub index: usize,
    pub step: FailureStep,
    pub message: String,
}

/// Outcome of a whole run.
///
/// Displays as `<succeeded> / <clients>`.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub clients: usize,
    pub succeeded: u64,
    pub failures: Vec<ClientFailure>,
    pub messages_sent: u64,
    pub bytes_sent: u64,
    pub messages_received: u64,
    pub peak_concurrency: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Failures at the given step, sorted by client index
    pub fn failures_at(&self, step: FailureStep) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .failures
            .iter()
            .filter(|f| f.step == step)
            .map(|f| f.index)
            .collect();
        indices.sort_unstable();
        indices
    }

    /// Multi-line human readable report
    pub fn report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!(
            "clients: {} ok, {} failed, {} total\n",
            self.succeeded,
            self.failures.len(),
            self.clients
        ));
        report.push_str(&format!(
            "events sent: {} ({} payload bytes)\n",
            self.messages_sent, self.bytes_sent
        ));
        report.push_str(&format!("frames received: {}\n", self.messages_received));
        report.push_str(&format!("peak concurrency: {}\n", self.peak_concurrency));
        report.push_str(&format!("elapsed: {:.2}s", self.elapsed.as_secs_f64()));
        report
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.succeeded, self.clients)
    }
}
