use crate::{AlertKind, IngestionStatus, SelectOption, StageId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub stages: Vec<StageView>,
    pub ingestion: IngestionStatus,
    pub alert: Option<AlertView>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn stage(&self, id: StageId) -> Option<&StageView> {
        self.stages.iter().find(|stage| stage.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageView {
    pub id: StageId,
    pub options: Vec<SelectOption>,
    pub selected_key: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    /// False while the parent stage has no selection.
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertView {
    pub message: String,
    pub kind: AlertKind,
}
