use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::{AlertKind, AlertToken, FetchTicket, SelectOption, StageId};

/// Messages that may raise an alert carry `at`, the monotonic instant the
/// alert's expiry is measured from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// View opened; load the root stage.
    Initialize,
    /// User picked an option, or cleared the stage with `None`.
    StageSelected {
        stage: StageId,
        key: Option<String>,
        at: Instant,
    },
    /// User asked to reload a stage whose fetch failed.
    RetryStage { stage: StageId, at: Instant },
    /// Engine finished an option fetch.
    OptionsLoaded {
        stage: StageId,
        ticket: FetchTicket,
        parent_key: Option<String>,
        result: Result<Vec<SelectOption>, String>,
        at: Instant,
    },
    /// User submitted the ingestion form. `now` anchors the time range.
    IngestClicked { now: DateTime<Utc>, at: Instant },
    /// Engine finished the ingestion submit.
    IngestionFinished { result: Result<(), String>, at: Instant },
    /// Raise a transient notification from outside the update loop.
    AlertRaised {
        message: String,
        kind: AlertKind,
        at: Instant,
    },
    /// A scheduled alert expiry fired.
    AlertExpired { token: AlertToken },
    /// User closed the alert.
    AlertDismissed,
    /// Fallback for placeholder wiring.
    NoOp,
}
