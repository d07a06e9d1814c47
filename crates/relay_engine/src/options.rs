use engine_logging::engine_debug;
use relay_core::{time_range, SelectOption, StageId};
use serde::Deserialize;

use crate::http::{check_status, map_reqwest_error, HttpBackend};
use crate::{FailureKind, TransportError};

/// Loads the option list for one stage given its parent's selected key.
#[async_trait::async_trait]
pub trait OptionFetcher: Send + Sync {
    async fn fetch_options(
        &self,
        stage: StageId,
        parent_key: Option<&str>,
    ) -> Result<Vec<SelectOption>, TransportError>;
}

/// `{id, name}`-shaped record; Mattermost also sends a human `display_name`.
/// Channel records carry the owning team's id.
#[derive(Debug, Deserialize)]
struct OptionRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "displayName")]
    display_name: Option<String>,
    #[serde(default, alias = "teamId")]
    team_id: Option<String>,
}

impl From<OptionRecord> for SelectOption {
    fn from(record: OptionRecord) -> Self {
        let label = record
            .display_name
            .filter(|label| !label.trim().is_empty())
            .or(record.name)
            .unwrap_or_else(|| record.id.clone());
        SelectOption::new(record.id, label)
    }
}

#[async_trait::async_trait]
impl OptionFetcher for HttpBackend {
    async fn fetch_options(
        &self,
        stage: StageId,
        parent_key: Option<&str>,
    ) -> Result<Vec<SelectOption>, TransportError> {
        // The backend lists every channel at once; the team filter is ours.
        let (url, team_filter) = match (stage, parent_key) {
            (StageId::Team, _) => (self.endpoint(&["api", "mattermost", "teams"]), None),
            (StageId::Channel, Some(team_id)) => (
                self.endpoint(&["api", "mattermost", "channels"]),
                Some(team_id),
            ),
            (StageId::Channel, None) => {
                return Err(TransportError::new(
                    FailureKind::InvalidUrl,
                    "channel options need a team",
                ))
            }
            (StageId::TimeRange, _) => return Ok(time_range::catalog()),
        };

        engine_debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        check_status(&response)?;
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let records: Vec<OptionRecord> = serde_json::from_slice(&body)
            .map_err(|err| TransportError::new(FailureKind::Decode, err.to_string()))?;
        Ok(records
            .into_iter()
            .filter(|record| match team_filter {
                Some(team_id) => record.team_id.as_deref() == Some(team_id),
                None => true,
            })
            .map(SelectOption::from)
            .collect())
    }
}
