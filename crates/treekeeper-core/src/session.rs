use std::time::{Duration, Instant};

/// How long save feedback (success or error) stays visible before the
/// session reverts to idle.
pub const SAVE_FEEDBACK: Duration = Duration::from_millis(800);

/// Observable state of a field edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Displayed value matches the last-saved value; no save control shown.
    Idle,
    /// User-edited value differs from the last-saved value.
    Dirty,
    /// A write is in flight.
    Saving,
    /// The write succeeded; transient.
    Success,
    /// The write failed; the message doubles as the control label. Transient:
    /// it clears after the feedback delay without being resolved.
    Error(String),
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Saving,
    Success { until: Instant },
    Error { message: String, until: Instant },
}

/// Dirty-tracking and save-feedback state machine for one editable field.
///
/// `Idle -> Dirty -> Saving -> Success | Error -> Idle`. Dirty is derived by
/// comparing the edited value against the last-saved value, so presentation
/// strings always come from one canonical value holder. Editing stays
/// allowed while a save is in flight; the save uses the value captured at
/// submit time.
#[derive(Debug, Clone)]
pub struct FieldEditSession<V> {
    value: V,
    saved: V,
    pending: Option<V>,
    phase: Phase,
    feedback_delay: Duration,
}

impl<V: Clone + PartialEq> FieldEditSession<V> {
    pub fn new(initial: V) -> Self {
        Self::with_feedback_delay(initial, SAVE_FEEDBACK)
    }

    pub fn with_feedback_delay(initial: V, feedback_delay: Duration) -> Self {
        Self {
            value: initial.clone(),
            saved: initial,
            pending: None,
            phase: Phase::Idle,
            feedback_delay,
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn set_value(&mut self, value: V) {
        self.value = value;
    }

    /// Replace both the edited and last-saved value, e.g. after the backing
    /// record was refetched. Discards any local edits.
    pub fn reload(&mut self, value: V) {
        self.value = value.clone();
        self.saved = value;
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self.phase, Phase::Idle) && self.value != self.saved
    }

    pub fn state(&self) -> SessionState {
        match &self.phase {
            Phase::Saving => SessionState::Saving,
            Phase::Success { .. } => SessionState::Success,
            Phase::Error { message, .. } => SessionState::Error(message.clone()),
            Phase::Idle if self.value != self.saved => SessionState::Dirty,
            Phase::Idle => SessionState::Idle,
        }
    }

    /// Capture the value for a save. Returns `None` while a save is already
    /// in flight; the second submit is dropped, not queued.
    pub fn begin_save(&mut self) -> Option<V> {
        if matches!(self.phase, Phase::Saving) {
            return None;
        }
        self.phase = Phase::Saving;
        let captured = self.value.clone();
        self.pending = Some(captured.clone());
        Some(captured)
    }

    pub fn resolve(&mut self, result: Result<(), String>) {
        self.resolve_at(result, Instant::now());
    }

    /// Settle the in-flight save. The feedback deadline starts here, after
    /// the write completed, never in parallel with it. A resolve without a
    /// matching `begin_save` is a no-op, so a torn-down-and-rebuilt session
    /// cannot be corrupted by a stale completion.
    pub fn resolve_at(&mut self, result: Result<(), String>, now: Instant) {
        if !matches!(self.phase, Phase::Saving) {
            return;
        }
        let until = now + self.feedback_delay;
        match result {
            Ok(()) => {
                if let Some(sent) = self.pending.take() {
                    self.saved = sent;
                }
                self.phase = Phase::Success { until };
            }
            Err(message) => {
                self.pending = None;
                self.phase = Phase::Error { message, until };
            }
        }
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Expire transient feedback. Errors clear too, without being resolved;
    /// the user retries by submitting again.
    pub fn tick_at(&mut self, now: Instant) {
        let expired = match &self.phase {
            Phase::Success { until } | Phase::Error { until, .. } => now >= *until,
            _ => false,
        };
        if expired {
            self.phase = Phase::Idle;
        }
    }

    /// True while success/error feedback is on screen; the event loop polls
    /// with a timeout instead of blocking so `tick` gets a chance to run.
    pub fn has_pending_feedback(&self) -> bool {
        matches!(self.phase, Phase::Success { .. } | Phase::Error { .. })
    }

    pub fn is_saving(&self) -> bool {
        matches!(self.phase, Phase::Saving)
    }
}
