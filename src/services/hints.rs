use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{HintRecord, HintReply, HintState};

/// Fetches the hint for one step of a problem.
#[async_trait]
pub trait HintProvider: Send + Sync {
    async fn generate_hint(&self, problem_text: &str, step_index: usize) -> AppResult<HintReply>;
}

/// Progressive hints for a single problem.
///
/// Each [`request_next`](Self::request_next) reveals one more hint until either
/// `max_hints` records exist or the provider flags a reply as final. After that
/// the session is exhausted and keeps answering with the last record.
///
/// Not meant for concurrent use: `request_next` takes `&mut self`, so at most
/// one call can be in flight.
pub struct HintSession {
    id: Uuid,
    problem_text: String,
    max_hints: usize,
    hints: Vec<HintRecord>,
    state: HintState,
    last_error: Option<String>,
    provider: Arc<dyn HintProvider>,
}

impl HintSession {
    pub fn new(
        problem_text: impl Into<String>,
        max_hints: usize,
        provider: Arc<dyn HintProvider>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            problem_text: problem_text.into(),
            max_hints,
            hints: Vec::new(),
            state: HintState::Empty,
            last_error: None,
            provider,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn problem_text(&self) -> &str {
        &self.problem_text
    }

    pub fn state(&self) -> HintState {
        self.state
    }

    pub fn current_hints(&self) -> &[HintRecord] {
        &self.hints
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == HintState::Exhausted
    }

    /// Reveal the next hint.
    ///
    /// Once exhausted this returns the last record without calling the
    /// provider. A failed call appends nothing and leaves the session in
    /// `Error`; calling again retries the same step. Dropping the returned
    /// future mid-call puts the session back in the state it had before.
    pub async fn request_next(&mut self) -> AppResult<HintRecord> {
        if self.state != HintState::Exhausted && self.hints.len() >= self.max_hints {
            self.state = HintState::Exhausted;
        }
        if self.state == HintState::Exhausted {
            return self.hints.last().cloned().ok_or(AppError::HintsExhausted);
        }

        let step_index = self.hints.len();
        let guard = AwaitingGuard::enter(&mut self.state);
        log::info!("💡 Session {}: requesting hint {}", self.id, step_index + 1);

        let outcome = self.provider.generate_hint(&self.problem_text, step_index).await;
        match outcome {
            Ok(reply) => {
                let record = HintRecord {
                    step_index,
                    content: reply.content,
                    is_final: reply.is_final.unwrap_or(false),
                    revealed_at: Utc::now(),
                };
                let exhausted = record.is_final || step_index + 1 >= self.max_hints;
                guard.settle(if exhausted {
                    HintState::Exhausted
                } else {
                    HintState::HasHints
                });

                self.hints.push(record.clone());
                self.last_error = None;
                if exhausted {
                    log::info!("Session {}: no hints left after {}", self.id, self.hints.len());
                }
                Ok(record)
            }
            Err(e) => {
                guard.settle(HintState::Error);
                log::error!("❌ Session {}: hint {} failed: {}", self.id, step_index + 1, e);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for HintSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HintSession")
            .field("id", &self.id)
            .field("max_hints", &self.max_hints)
            .field("hints", &self.hints.len())
            .field("state", &self.state)
            .finish()
    }
}

/// Holds the session in `Awaiting` for the duration of a provider call and
/// rolls back to the previous state if the call never settles.
struct AwaitingGuard<'a> {
    state: &'a mut HintState,
    previous: HintState,
}

impl<'a> AwaitingGuard<'a> {
    fn enter(state: &'a mut HintState) -> Self {
        let previous = *state;
        *state = HintState::Awaiting;
        Self { state, previous }
    }

    fn settle(self, next: HintState) {
        *self.state = next;
    }
}

impl Drop for AwaitingGuard<'_> {
    fn drop(&mut self) {
        if *self.state == HintState::Awaiting {
            *self.state = self.previous;
        }
    }
}
