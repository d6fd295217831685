//! Submission lifecycle for a single user.
//!
//! At most one analysis is outstanding at a time. Allowed transitions:
//! `Idle -> InFlight`, `InFlight -> Succeeded | Failed`, and
//! `Succeeded | Failed -> InFlight` on resubmission.
//!
//! A submission whose future is dropped before it finishes (timeout,
//! cancellation) goes to `Failed` through [`SubmissionGuard`], so the session
//! never stays `InFlight` with nobody left to finish it.

use crate::{Error, Result};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub const CANCELLED_MESSAGE: &str =
    "The analysis was cancelled before it finished. Please submit again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    InFlight { id: Uuid },
    Succeeded(String),
    Failed(String),
}

/// What the screen shows. Exactly one of these at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Empty,
    Loading,
    Error(String),
    Result(String),
}

#[derive(Debug)]
pub struct Session {
    state: Mutex<SubmissionState>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SubmissionState::Idle),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SubmissionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> SubmissionState {
        self.lock().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(*self.lock(), SubmissionState::InFlight { .. })
    }

    /// Start a submission, discarding any previous result or error.
    pub fn begin(&self) -> Result<Uuid> {
        let mut state = self.lock();
        if let SubmissionState::InFlight { id } = &*state {
            return Err(Error::InvalidState(format!(
                "submission {} is still in flight",
                id
            )));
        }

        let id = Uuid::new_v4();
        *state = SubmissionState::InFlight { id };
        Ok(id)
    }

    /// Like [`Session::begin`], but the returned guard fails the submission
    /// if it is dropped before `succeed` or `fail` is called on it.
    pub fn begin_guarded(&self) -> Result<SubmissionGuard<'_>> {
        let id = self.begin()?;
        Ok(SubmissionGuard {
            session: self,
            id,
            finished: false,
        })
    }

    /// Fail submission `id` if it is still the one in flight. No-op otherwise.
    pub fn abandon(&self, id: Uuid) {
        let mut state = self.lock();
        if matches!(&*state, SubmissionState::InFlight { id: current } if *current == id) {
            tracing::warn!("Submission {} abandoned before completion", id);
            *state = SubmissionState::Failed(CANCELLED_MESSAGE.to_string());
        }
    }

    pub fn succeed(&self, id: Uuid, text: String) -> Result<()> {
        self.finish(id, SubmissionState::Succeeded(text))
    }

    pub fn fail(&self, id: Uuid, message: String) -> Result<()> {
        self.finish(id, SubmissionState::Failed(message))
    }

    fn finish(&self, id: Uuid, next: SubmissionState) -> Result<()> {
        let mut state = self.lock();
        let in_flight = match &*state {
            SubmissionState::InFlight { id } => Some(*id),
            _ => None,
        };

        match in_flight {
            Some(current) if current == id => {
                *state = next;
                Ok(())
            }
            Some(current) => Err(Error::InvalidState(format!(
                "submission {} finished but {} is in flight",
                id, current
            ))),
            None => Err(Error::InvalidState(format!(
                "submission {} finished but nothing is in flight",
                id
            ))),
        }
    }

    pub fn view(&self) -> View {
        match &*self.lock() {
            SubmissionState::Idle => View::Empty,
            SubmissionState::InFlight { .. } => View::Loading,
            SubmissionState::Succeeded(text) => View::Result(text.clone()),
            SubmissionState::Failed(message) => View::Error(message.clone()),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// An in-flight submission. Dropping it unfinished abandons the submission.
#[derive(Debug)]
pub struct SubmissionGuard<'a> {
    session: &'a Session,
    id: Uuid,
    finished: bool,
}

impl SubmissionGuard<'_> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn succeed(mut self, text: String) -> Result<()> {
        self.finished = true;
        self.session.succeed(self.id, text)
    }

    pub fn fail(mut self, message: String) -> Result<()> {
        self.finished = true;
        self.session.fail(self.id, message)
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.session.abandon(self.id);
        }
    }
}
