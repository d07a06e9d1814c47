use crate::view_model::{AlertView, AppViewModel, StageView};
use crate::{AlertTimer, IngestionRequest, SelectionController, TimeRangePolicy};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IngestionStatus {
    #[default]
    Idle,
    Submitting(IngestionRequest),
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) selection: SelectionController,
    pub(crate) policy: TimeRangePolicy,
    pub(crate) ingestion: IngestionStatus,
    pub(crate) alerts: AlertTimer,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: TimeRangePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn ingestion(&self) -> &IngestionStatus {
        &self.ingestion
    }

    pub fn alerts(&self) -> &AlertTimer {
        &self.alerts
    }

    pub fn view(&self) -> AppViewModel {
        let snapshot = self.selection.current_state();
        let stages = snapshot
            .stages()
            .iter()
            .map(|stage| StageView {
                id: stage.id,
                options: stage.options.clone(),
                selected_key: stage.selected_key.clone(),
                loading: stage.loading,
                error: stage.error.clone(),
                enabled: stage
                    .depends_on
                    .is_none_or(|parent| snapshot.selected(parent).is_some()),
            })
            .collect();

        AppViewModel {
            stages,
            ingestion: self.ingestion.clone(),
            alert: self.alerts.current().map(|alert| AlertView {
                message: alert.message.clone(),
                kind: alert.kind,
            }),
            dirty: self.dirty,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
