use serde::Serialize;

use crate::{SelectionSnapshot, StageId};

/// Stages that must carry a selection before an ingestion can be composed.
pub const REQUIRED_STAGES: [StageId; 2] = [StageId::Team, StageId::Channel];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRangePolicy {
    /// The backend needs a `since` bound.
    #[default]
    Required,
    /// Ingest the full channel history when no range is chosen.
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionRequest {
    pub channel_id: String,
    pub since_timestamp_ms: Option<i64>,
}

impl IngestionRequest {
    /// Query parameters as sent to the ingest endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("channelId", self.channel_id.clone())];
        if let Some(since) = self.since_timestamp_ms {
            pairs.push(("since", since.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error("Please select a {stage}")]
    IncompleteSelection { stage: StageId },
    #[error("Please select a time range")]
    MissingTimeRange,
}

/// Validates the selection chain and assembles the ingestion request.
pub fn compose(
    snapshot: &SelectionSnapshot,
    resolved_since: Option<i64>,
    policy: TimeRangePolicy,
) -> Result<IngestionRequest, ComposeError> {
    if let Some(stage) = REQUIRED_STAGES
        .iter()
        .copied()
        .find(|stage| snapshot.selected(*stage).is_none())
    {
        return Err(ComposeError::IncompleteSelection { stage });
    }

    if policy == TimeRangePolicy::Required && resolved_since.is_none() {
        return Err(ComposeError::MissingTimeRange);
    }

    let channel_id = snapshot
        .selected(StageId::Channel)
        .map(ToOwned::to_owned)
        .ok_or(ComposeError::IncompleteSelection {
            stage: StageId::Channel,
        })?;

    Ok(IngestionRequest {
        channel_id,
        since_timestamp_ms: resolved_since,
    })
}
