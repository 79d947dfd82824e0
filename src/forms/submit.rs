//! Submission seam: the handler trait, its error channel and the lifecycle guard

use super::form_state::FormStateSnapshot;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Handler that receives validated form data
///
/// A returned error, or any message recorded through `errors`, becomes a
/// submission-level error on the form. Field errors are never touched.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmitHandler<R: Send + Sync + 'static>: Send + Sync {
    async fn submit(
        &self,
        data: R,
        state: FormStateSnapshot,
        errors: SubmitErrors,
    ) -> anyhow::Result<()>;
}

/// Channel through which a submit handler reports submission-level errors
#[derive(Debug, Clone, Default)]
pub struct SubmitErrors(Arc<Mutex<Vec<String>>>);

impl SubmitErrors {
    /// Record a submission-level error; repeated calls keep every message in order
    pub fn set_error(&self, message: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.into());
    }

    pub(crate) fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Submit event as delivered by a frontend's form element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitEvent {
    default_prevented: bool,
    propagation_stopped: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// How a submission attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The form was not submittable when submission was requested
    Rejected,
    /// Whole-form validation failed; the handler was not called
    Invalid,
    /// The handler completed without reporting errors
    Submitted,
    /// The handler failed or reported submission-level errors
    Failed { errors: Vec<String> },
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted)
    }
}

/// Raises a lifecycle flag and lowers it again when dropped
///
/// Lowering happens on every exit path, including an error, a panic unwinding
/// through the scope, or the owning future being dropped mid-await. When bound
/// to a state channel the drop also publishes the lowered flag, so subscribers
/// never keep a snapshot that claims work is still in flight.
pub(crate) struct FlagGuard {
    flag: Arc<AtomicBool>,
    state: Option<(watch::Sender<FormStateSnapshot>, fn(&mut FormStateSnapshot))>,
}

impl FlagGuard {
    pub(crate) fn raise(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self {
            flag: Arc::clone(flag),
            state: None,
        }
    }

    /// Also clear the flag in the last published snapshot on drop
    pub(crate) fn publishing(
        mut self,
        state_tx: &watch::Sender<FormStateSnapshot>,
        lower: fn(&mut FormStateSnapshot),
    ) -> Self {
        self.state = Some((state_tx.clone(), lower));
        self
    }
}

impl Drop for FlagGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        if let Some((state_tx, lower)) = self.state.take() {
            state_tx.send_modify(|state| {
                lower(state);
                state.is_submittable =
                    state.is_valid && !state.is_validating && !state.is_submitting;
            });
        }
    }
}

/// Message for a failed handler, falling back when the error has no text
pub(crate) fn failure_message(error: &anyhow::Error, fallback: &str) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_submit_errors_shared_between_clones() {
        let errors = SubmitErrors::default();
        let handle = errors.clone();
        handle.set_error("conflict");
        handle.set_error("retry later");
        assert_eq!(errors.take(), vec!["conflict", "retry later"]);
        assert!(errors.take().is_empty());
    }

    #[test]
    fn test_submit_event_flags() {
        let mut event = SubmitEvent::new();
        assert!(!event.default_prevented());
        event.prevent_default();
        event.stop_propagation();
        assert!(event.default_prevented());
        assert!(event.propagation_stopped());
    }

    #[test]
    fn test_flag_guard_lowers_on_drop() {
        let flag = Arc::new(AtomicBool::new(false));
        {
            let _guard = FlagGuard::raise(&flag);
            assert!(flag.load(Ordering::SeqCst));
        }
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_flag_guard_publishes_lowered_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let (state_tx, rx) = watch::channel(FormStateSnapshot {
            is_valid: true,
            is_submitting: true,
            ..Default::default()
        });
        {
            let _guard = FlagGuard::raise(&flag).publishing(&state_tx, |state| {
                state.is_submitting = false;
            });
        }
        let state = rx.borrow().clone();
        assert!(!state.is_submitting);
        assert!(state.is_submittable);
    }

    #[test]
    fn test_flag_guard_lowers_when_future_is_dropped() {
        let flag = Arc::new(AtomicBool::new(false));
        let inner = flag.clone();
        let pending = async move {
            let _guard = FlagGuard::raise(&inner);
            std::future::pending::<()>().await;
        };
        let mut task = tokio_test::task::spawn(pending);
        assert!(task.poll().is_pending());
        assert!(flag.load(Ordering::SeqCst));
        drop(task);
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_failure_message_uses_error_text() {
        let err = anyhow::anyhow!("network down");
        assert_eq!(failure_message(&err, "fallback"), "network down");
    }

    #[test]
    fn test_failure_message_falls_back_on_blank_text() {
        let err = anyhow::anyhow!("  ");
        assert_eq!(failure_message(&err, "Submission failed"), "Submission failed");
    }

    #[test]
    fn test_outcome_is_submitted() {
        assert!(SubmitOutcome::Submitted.is_submitted());
        assert!(!SubmitOutcome::Invalid.is_submitted());
    }
}
