//! External scoring collaborators
//!
//! Three signals come from outside the local analyzers:
//!
//! - [`TextNaturalness`]: how machine-written the commit message reads
//! - [`SemanticCoherence`]: how tightly the message narrates its own diff
//! - [`BorderlineAdjudicator`]: an optional second opinion (usually an LLM)
//!   for aggregate scores that land in the uncertain band
//!
//! Every call goes through [`Collaborators`], which runs it on a worker
//! thread with a bounded wait. Errors, panics and timeouts degrade to a
//! neutral zero-score result naming the collaborator; they never reach the
//! aggregator as failures.

pub mod coherence;
pub mod message;

use crate::models::DetectorResult;
use crossbeam_channel::RecvTimeoutError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub use coherence::LexicalCoherence;
pub use message::RuleBasedText;

pub const DEFAULT_SIGNAL_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_ADJUDICATOR_TIMEOUT: Duration = Duration::from_secs(60);

/// Why a collaborator produced no usable answer.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("{collaborator} timed out after {:.1}s", .timeout.as_secs_f64())]
    Timeout {
        collaborator: String,
        timeout: Duration,
    },

    #[error("{collaborator} unavailable: {message}")]
    Unavailable {
        collaborator: String,
        message: String,
    },

    #[error("{collaborator} stopped without answering")]
    Crashed { collaborator: String },

    #[error("{collaborator} disabled after an earlier timeout")]
    Stalled { collaborator: String },
}

impl SignalError {
    pub fn unavailable(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        SignalError::Unavailable {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }
}

pub type SignalResult<T> = Result<T, SignalError>;

/// Scores a commit message for machine-written phrasing.
pub trait TextNaturalness: Send + Sync {
    fn name(&self) -> &str;
    fn score(&self, message: &str, diff_lines: usize) -> SignalResult<DetectorResult>;
}

/// Scores how closely a message restates its diff.
///
/// Inputs too short to judge must give a zero score with a reason, not an
/// error.
pub trait SemanticCoherence: Send + Sync {
    fn name(&self) -> &str;
    fn score(&self, message: &str, diff: &str) -> SignalResult<DetectorResult>;
}

/// Second opinion for borderline aggregate scores.
pub trait BorderlineAdjudicator: Send + Sync {
    fn name(&self) -> &str;
    fn adjudicate(&self, diff: &str, message: &str) -> SignalResult<Adjudication>;
}

/// Answer from a [`BorderlineAdjudicator`].
#[derive(Debug, Clone, PartialEq)]
pub enum Adjudication {
    /// Keep the aggregate score.
    NoOpinion,
    /// Replace the aggregate score. `score` is in [0, 1].
    Verdict { score: f64, reason: String },
}

impl Adjudication {
    /// Map a raw `(score, reason)` pair where any negative score (the `-1`
    /// sentinel) means "no opinion".
    pub fn from_raw(score: f64, reason: impl Into<String>) -> Self {
        if !score.is_finite() || score < 0.0 {
            return Adjudication::NoOpinion;
        }
        Adjudication::Verdict {
            score: score.min(1.0),
            reason: reason.into(),
        }
    }
}

/// Run `f` on its own thread and wait at most `timeout` for the answer.
///
/// A collaborator that hangs is abandoned, not joined: its thread runs on
/// until `f` returns, one thread per timed-out call. [`Collaborators`] stops
/// calling a collaborator after its first timeout so a scan leaks at most
/// one thread per collaborator.
pub fn call_with_timeout<R, F>(collaborator: &str, timeout: Duration, f: F) -> SignalResult<R>
where
    R: Send + 'static,
    F: FnOnce() -> SignalResult<R> + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::Builder::new()
        .name(format!("signal-{collaborator}"))
        .spawn(move || {
            let _ = tx.send(f());
        })
        .map_err(|e| SignalError::unavailable(collaborator, e.to_string()))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(SignalError::Timeout {
            collaborator: collaborator.to_string(),
            timeout,
        }),
        Err(RecvTimeoutError::Disconnected) => Err(SignalError::Crashed {
            collaborator: collaborator.to_string(),
        }),
    }
}

/// Trips on the first timeout and refuses further calls.
#[derive(Debug, Clone, Default)]
struct Breaker(Arc<AtomicBool>);

impl Breaker {
    fn call<R, F>(&self, collaborator: &str, timeout: Duration, f: F) -> SignalResult<R>
    where
        R: Send + 'static,
        F: FnOnce() -> SignalResult<R> + Send + 'static,
    {
        if self.0.load(Ordering::Relaxed) {
            return Err(SignalError::Stalled {
                collaborator: collaborator.to_string(),
            });
        }
        let result = call_with_timeout(collaborator, timeout, f);
        if matches!(result, Err(SignalError::Timeout { .. })) {
            self.0.store(true, Ordering::Relaxed);
        }
        result
    }
}

fn neutral(err: SignalError) -> DetectorResult {
    warn!("{}", err);
    DetectorResult::no_signal(format!("Signal skipped: {err}"))
}

/// The set of external collaborators used by one scan.
#[derive(Clone)]
pub struct Collaborators {
    text: Arc<dyn TextNaturalness>,
    semantic: Arc<dyn SemanticCoherence>,
    adjudicator: Option<Arc<dyn BorderlineAdjudicator>>,
    timeout: Duration,
    adjudicator_timeout: Duration,
    breakers: [Breaker; 3],
}

impl Default for Collaborators {
    /// Local rule-based signals, no adjudicator.
    fn default() -> Self {
        Self::new(Arc::new(RuleBasedText), Arc::new(LexicalCoherence))
    }
}

impl Collaborators {
    pub fn new(text: Arc<dyn TextNaturalness>, semantic: Arc<dyn SemanticCoherence>) -> Self {
        Self {
            text,
            semantic,
            adjudicator: None,
            timeout: DEFAULT_SIGNAL_TIMEOUT,
            adjudicator_timeout: DEFAULT_ADJUDICATOR_TIMEOUT,
            breakers: Default::default(),
        }
    }

    pub fn with_adjudicator(mut self, adjudicator: Arc<dyn BorderlineAdjudicator>) -> Self {
        self.adjudicator = Some(adjudicator);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_adjudicator_timeout(mut self, timeout: Duration) -> Self {
        self.adjudicator_timeout = timeout;
        self
    }

    pub fn has_adjudicator(&self) -> bool {
        self.adjudicator.is_some()
    }

    pub fn text(&self, message: &str, diff_lines: usize) -> DetectorResult {
        let text = Arc::clone(&self.text);
        let name = text.name().to_string();
        let message = message.to_string();
        self.breakers[0]
            .call(&name, self.timeout, move || text.score(&message, diff_lines))
            .unwrap_or_else(neutral)
    }

    pub fn semantic(&self, message: &str, diff: &str) -> DetectorResult {
        let semantic = Arc::clone(&self.semantic);
        let name = semantic.name().to_string();
        let (message, diff) = (message.to_string(), diff.to_string());
        self.breakers[1]
            .call(&name, self.timeout, move || semantic.score(&message, &diff))
            .unwrap_or_else(neutral)
    }

    /// Ask the adjudicator, if any. Failures mean no opinion.
    pub fn adjudicate(&self, diff: &str, message: &str) -> Adjudication {
        let Some(adjudicator) = self.adjudicator.as_ref().map(Arc::clone) else {
            return Adjudication::NoOpinion;
        };
        let name = adjudicator.name().to_string();
        let (diff, message) = (diff.to_string(), message.to_string());
        match self.breakers[2].call(&name, self.adjudicator_timeout, move || {
            adjudicator.adjudicate(&diff, &message)
        }) {
            Ok(answer) => answer,
            Err(e) => {
                debug!("Adjudication skipped: {}", e);
                Adjudication::NoOpinion
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slow;

    impl TextNaturalness for Slow {
        fn name(&self) -> &str {
            "slow-text"
        }
        fn score(&self, _message: &str, _diff_lines: usize) -> SignalResult<DetectorResult> {
            std::thread::sleep(Duration::from_secs(5));
            Ok(DetectorResult::new(1.0, "too late"))
        }
    }

    struct Hangs(Arc<std::sync::atomic::AtomicUsize>);

    impl TextNaturalness for Hangs {
        fn name(&self) -> &str {
            "hung-text"
        }
        fn score(&self, _message: &str, _diff_lines: usize) -> SignalResult<DetectorResult> {
            self.0.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_secs(5));
            Ok(DetectorResult::new(1.0, "too late"))
        }
    }

    struct Broken;

    impl SemanticCoherence for Broken {
        fn name(&self) -> &str {
            "embedding-model"
        }
        fn score(&self, _message: &str, _diff: &str) -> SignalResult<DetectorResult> {
            Err(SignalError::unavailable("embedding-model", "model not installed"))
        }
    }

    struct Panics;

    impl BorderlineAdjudicator for Panics {
        fn name(&self) -> &str {
            "panicky"
        }
        fn adjudicate(&self, _diff: &str, _message: &str) -> SignalResult<Adjudication> {
            panic!("boom")
        }
    }

    struct Fixed(f64);

    impl BorderlineAdjudicator for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn adjudicate(&self, _diff: &str, _message: &str) -> SignalResult<Adjudication> {
            Ok(Adjudication::from_raw(self.0, "fixed answer"))
        }
    }

    #[test]
    fn test_timeout_is_neutral() {
        let hub = Collaborators::new(Arc::new(Slow), Arc::new(LexicalCoherence))
            .with_timeout(Duration::from_millis(50));
        let r = hub.text("feat: add things", 10);
        assert_eq!(r.score, 0.0);
        assert!(r.reason.contains("slow-text"));
        assert!(r.reason.contains("timed out"));
    }

    #[test]
    fn test_hung_collaborator_called_once() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let hub = Collaborators::new(Arc::new(Hangs(Arc::clone(&calls))), Arc::new(LexicalCoherence))
            .with_timeout(Duration::from_millis(50));

        assert!(hub.text("first", 10).reason.contains("timed out"));
        for _ in 0..3 {
            let r = hub.text("again", 10);
            assert_eq!(r.score, 0.0);
            assert!(r.reason.contains("hung-text disabled"), "{}", r.reason);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Other collaborators are unaffected
        assert!(!hub
            .semantic("load users", "def load_users(): pass")
            .reason
            .contains("disabled"));
    }

    #[test]
    fn test_error_is_neutral() {
        let hub = Collaborators::new(Arc::new(RuleBasedText), Arc::new(Broken));
        let r = hub.semantic("add user loading helpers", "def load_users(): pass");
        assert_eq!(r.score, 0.0);
        assert!(r.reason.contains("embedding-model"));
    }

    #[test]
    fn test_panicking_adjudicator_has_no_opinion() {
        let hub = Collaborators::default().with_adjudicator(Arc::new(Panics));
        assert_eq!(hub.adjudicate("diff", "msg"), Adjudication::NoOpinion);
    }

    #[test]
    fn test_missing_adjudicator_has_no_opinion() {
        assert!(!Collaborators::default().has_adjudicator());
        assert_eq!(
            Collaborators::default().adjudicate("diff", "msg"),
            Adjudication::NoOpinion
        );
    }

    #[test]
    fn test_adjudication_from_raw() {
        assert_eq!(Adjudication::from_raw(-1.0, "x"), Adjudication::NoOpinion);
        assert_eq!(Adjudication::from_raw(f64::NAN, "x"), Adjudication::NoOpinion);
        assert_eq!(
            Adjudication::from_raw(0.9, "x"),
            Adjudication::Verdict {
                score: 0.9,
                reason: "x".into()
            }
        );
        let hub = Collaborators::default().with_adjudicator(Arc::new(Fixed(0.7)));
        assert!(matches!(
            hub.adjudicate("d", "m"),
            Adjudication::Verdict { score, .. } if (score - 0.7).abs() < 1e-9
        ));
    }
}
