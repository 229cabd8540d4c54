//! Cooperative deferrals: a cancelable debounce timer and a frame batch.
//!
//! Nothing here runs on its own. The host passes the current [`Instant`] into
//! `poll`, which keeps timing deterministic and single-threaded.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::visibility::VisibilitySink;

/// Holds at most one pending value. Scheduling again replaces the value and
/// pushes the deadline out, so a burst of calls fires once, after the last.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self, now: Instant, value: T) {
        self.pending = Some((now + self.delay, value));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, value)| value)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Takes the value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    /// Takes the value regardless of the deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(_, value)| value)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Coalesces hidden-set updates into a single application per frame.
#[derive(Debug, Default)]
pub struct FrameBatch {
    applied: BTreeSet<String>,
    pending: Option<BTreeSet<String>>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrameDiff {
    pub hide: Vec<String>,
    pub show: Vec<String>,
}

impl FrameDiff {
    pub fn is_empty(&self) -> bool {
        self.hide.is_empty() && self.show.is_empty()
    }
}

impl FrameBatch {
    /// Queues `hidden` for the next frame, superseding any queued set.
    pub fn request(&mut self, hidden: BTreeSet<String>) {
        self.pending = Some(hidden);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn applied(&self) -> &BTreeSet<String> {
        &self.applied
    }

    /// Writes only the ids whose visibility changed since the last frame.
    pub fn run(&mut self, sink: &mut dyn VisibilitySink) -> FrameDiff {
        let Some(next) = self.pending.take() else {
            return FrameDiff::default();
        };

        let diff = FrameDiff {
            hide: next.difference(&self.applied).cloned().collect(),
            show: self.applied.difference(&next).cloned().collect(),
        };
        for id in &diff.hide {
            sink.set_hidden(id, true);
        }
        for id in &diff.show {
            sink.set_hidden(id, false);
        }
        self.applied = next;
        diff
    }
}
