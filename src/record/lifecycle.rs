//! Record status state machine
//!
//! Two forward branches share the `queued` start and the `done` end:
//!
//! - like: `queued → fetching → summarizing → done | error`
//! - bookmark: `queued → preparing → done`
//!
//! A user may later ask for the linked article of a finished record,
//! which is the one move out of a terminal state:
//! `done → fetching-article → done`. Any non-terminal state can fail
//! into `error`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Processing state of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Queued,
    Fetching,
    Summarizing,
    Preparing,
    FetchingArticle,
    Done,
    Error,
}

/// Something that happened to a record's pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    BeginFetch,
    /// Fetch finished, successfully or not
    FetchComplete,
    SummaryComplete,
    SummaryFailed,
    BeginAssembly,
    AssemblyComplete,
    /// User asked for the linked article of a finished record
    DeferredFetchRequested,
    DeferredFetchComplete,
    /// Unexpected failure in any non-terminal state
    Failed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("invalid transition: {event:?} from '{from}'")]
    InvalidTransition { from: Status, event: LifecycleEvent },
}

impl Status {
    /// State of a record that was just observed.
    pub fn initial() -> Self {
        Status::Queued
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Queued => "queued",
            Status::Fetching => "fetching",
            Status::Summarizing => "summarizing",
            Status::Preparing => "preparing",
            Status::FetchingArticle => "fetching-article",
            Status::Done => "done",
            Status::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Done | Status::Error)
    }

    /// Compute the next state, rejecting transitions outside the table.
    pub fn apply(self, event: LifecycleEvent) -> Result<Status, LifecycleError> {
        use LifecycleEvent::*;
        let next = match (self, event) {
            (Status::Queued, BeginFetch) => Status::Fetching,
            (Status::Fetching, FetchComplete) => Status::Summarizing,
            (Status::Summarizing, SummaryComplete) => Status::Done,
            (Status::Summarizing, SummaryFailed) => Status::Error,
            (Status::Queued, BeginAssembly) => Status::Preparing,
            (Status::Preparing, AssemblyComplete) => Status::Done,
            (Status::Done, DeferredFetchRequested) => Status::FetchingArticle,
            (Status::FetchingArticle, DeferredFetchComplete) => Status::Done,
            (from, Failed) if !from.is_terminal() => Status::Error,
            (from, event) => return Err(LifecycleError::InvalidTransition { from, event }),
        };
        Ok(next)
    }

    pub fn can_apply(self, event: LifecycleEvent) -> bool {
        self.apply(event).is_ok()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LifecycleEvent::*;

    fn run(events: &[LifecycleEvent]) -> Result<Status, LifecycleError> {
        events
            .iter()
            .try_fold(Status::initial(), |status, event| status.apply(*event))
    }

    #[test]
    fn like_branch_reaches_done() {
        assert_eq!(
            run(&[BeginFetch, FetchComplete, SummaryComplete]),
            Ok(Status::Done)
        );
    }

    #[test]
    fn like_branch_summary_failure_is_error() {
        assert_eq!(
            run(&[BeginFetch, FetchComplete, SummaryFailed]),
            Ok(Status::Error)
        );
    }

    #[test]
    fn bookmark_branch_reaches_done() {
        assert_eq!(run(&[BeginAssembly, AssemblyComplete]), Ok(Status::Done));
    }

    #[test]
    fn deferred_fetch_reenters_done() {
        assert_eq!(
            run(&[
                BeginAssembly,
                AssemblyComplete,
                DeferredFetchRequested,
                DeferredFetchComplete
            ]),
            Ok(Status::Done)
        );
    }

    #[test]
    fn deferred_fetch_requires_done() {
        assert!(!Status::Queued.can_apply(DeferredFetchRequested));
        assert!(!Status::Error.can_apply(DeferredFetchRequested));
        assert!(!Status::Summarizing.can_apply(DeferredFetchRequested));
    }

    #[test]
    fn any_non_terminal_state_can_fail() {
        for status in [
            Status::Queued,
            Status::Fetching,
            Status::Summarizing,
            Status::Preparing,
            Status::FetchingArticle,
        ] {
            assert_eq!(status.apply(Failed), Ok(Status::Error));
        }
    }

    #[test]
    fn terminal_states_do_not_fail_again() {
        assert!(Status::Done.apply(Failed).is_err());
        assert!(Status::Error.apply(Failed).is_err());
    }

    #[test]
    fn backward_moves_are_rejected() {
        let err = Status::Summarizing.apply(BeginFetch).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::InvalidTransition {
                from: Status::Summarizing,
                event: BeginFetch
            }
        );
        assert!(Status::Done.apply(BeginAssembly).is_err());
        assert!(Status::Preparing.apply(FetchComplete).is_err());
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&Status::FetchingArticle).unwrap();
        assert_eq!(json, "\"fetching-article\"");
        assert_eq!(Status::FetchingArticle.to_string(), "fetching-article");
    }
}
