use crate::condition::strict_equals;
use serde_json::Value;
use std::time::{Duration, Instant};

/// What a pending validation covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DebounceKey {
    Field(String),
    Form,
}

/// A validation waiting for its quiet period to elapse.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingValidation {
    pub key: DebounceKey,
    /// The field whose change scheduled this validation.
    pub field: String,
    /// The field's value when scheduled; the result is discarded if it differs at fire time.
    pub captured: Value,
    pub due: Instant,
}

impl PendingValidation {
    pub fn is_current(&self, value: &Value) -> bool {
        strict_equals(&self.captured, value)
    }
}

/// Last-write-wins debounce queue, driven by explicit instants so it can sit on
/// top of any timer or event loop.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Vec<PendingValidation>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Vec::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules a validation, cancelling any not-yet-fired one with the same key.
    /// Returns `true` if an earlier one was superseded.
    pub fn schedule(&mut self, key: DebounceKey, field: &str, captured: Value, now: Instant) -> bool {
        let superseded = self.cancel(&key);
        let due = now + self.delay;
        tracing::trace!(?key, field, superseded, "debounced validation scheduled");
        self.pending.push(PendingValidation {
            key,
            field: field.to_string(),
            captured,
            due,
        });
        superseded
    }

    pub fn cancel(&mut self, key: &DebounceKey) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.key != *key);
        before != self.pending.len()
    }

    pub fn cancel_all(&mut self) {
        if !self.pending.is_empty() {
            tracing::trace!(count = self.pending.len(), "pending validations cancelled");
        }
        self.pending.clear();
    }

    /// Removes and returns every validation due at `now`, in scheduling order.
    pub fn take_due(&mut self, now: Instant) -> Vec<PendingValidation> {
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = waiting;
        due
    }

    pub fn is_pending(&self, key: &DebounceKey) -> bool {
        self.pending.iter().any(|p| p.key == *key)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// The earliest instant at which [`Debouncer::take_due`] will return something.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.due).min()
    }
}
