use std::fmt;

use engine_logging::{engine_debug, engine_info};

/// One step in the dependent selection chain, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageId {
    Team,
    Channel,
    TimeRange,
}

impl StageId {
    pub const CHAIN: [StageId; 3] = [StageId::Team, StageId::Channel, StageId::TimeRange];

    fn index(self) -> usize {
        match self {
            StageId::Team => 0,
            StageId::Channel => 1,
            StageId::TimeRange => 2,
        }
    }

    pub fn parent(self) -> Option<StageId> {
        self.index().checked_sub(1).map(|idx| Self::CHAIN[idx])
    }

    pub fn child(self) -> Option<StageId> {
        Self::CHAIN.get(self.index() + 1).copied()
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageId::Team => write!(f, "team"),
            StageId::Channel => write!(f, "channel"),
            StageId::TimeRange => write!(f, "time range"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub key: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

pub type FetchTicket = u64;

/// An option fetch the controller wants performed.
///
/// The result must be handed back to [`SelectionController::apply_options`]
/// together with the same ticket and parent key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub stage: StageId,
    pub parent_key: Option<String>,
    pub ticket: FetchTicket,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionStage {
    pub id: StageId,
    pub options: Vec<SelectOption>,
    pub selected_key: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub depends_on: Option<StageId>,
    pending: Option<FetchTicket>,
}

impl SelectionStage {
    fn new(id: StageId) -> Self {
        Self {
            id,
            options: Vec::new(),
            selected_key: None,
            loading: false,
            error: None,
            depends_on: id.parent(),
            pending: None,
        }
    }

    fn reset(&mut self) {
        self.options.clear();
        self.selected_key = None;
        self.loading = false;
        self.error = None;
        self.pending = None;
    }

    pub fn has_option(&self, key: &str) -> bool {
        self.options.iter().any(|option| option.key == key)
    }
}

/// Immutable copy of every stage, in chain order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSnapshot {
    stages: Vec<SelectionStage>,
}

impl SelectionSnapshot {
    pub fn stages(&self) -> &[SelectionStage] {
        &self.stages
    }

    pub fn stage(&self, id: StageId) -> &SelectionStage {
        &self.stages[id.index()]
    }

    pub fn selected(&self, id: StageId) -> Option<&str> {
        self.stage(id).selected_key.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("'{key}' is not one of the available {stage} options")]
    InvalidSelection { stage: StageId, key: String },
    #[error("cannot reload {stage} options before a {parent} is selected")]
    NothingToRetry { stage: StageId, parent: StageId },
}

/// Owns the team -> channel -> time range chain.
///
/// Invariant: a stage whose parent has no selection holds no options and no
/// selection. Every upstream change goes through `invalidate_downstream`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionController {
    stages: Vec<SelectionStage>,
    next_ticket: FetchTicket,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionController {
    pub fn new() -> Self {
        Self {
            stages: StageId::CHAIN.iter().copied().map(SelectionStage::new).collect(),
            next_ticket: 1,
        }
    }

    pub fn stage(&self, id: StageId) -> &SelectionStage {
        &self.stages[id.index()]
    }

    pub fn current_state(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            stages: self.stages.clone(),
        }
    }

    /// Starts loading the root stage. Resets the whole chain.
    pub fn initialize(&mut self) -> FetchRequest {
        self.begin_fetch(StageId::Team, None)
    }

    /// Selects `key` (or clears the stage with `None`).
    ///
    /// Returns the child fetch to perform, if any. An unknown key is rejected
    /// and leaves the chain untouched. Reselecting the current key does not
    /// cascade, but re-fetches a direct child that previously failed.
    pub fn select(
        &mut self,
        stage: StageId,
        key: Option<&str>,
    ) -> Result<Option<FetchRequest>, SelectionError> {
        let current = self.stage(stage);
        if let Some(key) = key {
            if !current.has_option(key) {
                return Err(SelectionError::InvalidSelection {
                    stage,
                    key: key.to_owned(),
                });
            }
        }

        if current.selected_key.as_deref() == key {
            let retry_child = match (key, stage.child()) {
                (Some(key), Some(child)) if self.stage(child).error.is_some() => {
                    Some((child, key.to_owned()))
                }
                _ => None,
            };
            return Ok(retry_child.map(|(child, key)| self.begin_fetch(child, Some(key))));
        }

        engine_debug!("Selected {} = {:?}", stage, key);
        self.stages[stage.index()].selected_key = key.map(ToOwned::to_owned);
        self.invalidate_downstream(stage);

        Ok(match (key, stage.child()) {
            (Some(key), Some(child)) => Some(self.begin_fetch(child, Some(key.to_owned()))),
            _ => None,
        })
    }

    /// Re-fetches options for `stage` using its parent's current selection.
    pub fn retry(&mut self, stage: StageId) -> Result<FetchRequest, SelectionError> {
        let parent_key = match stage.parent() {
            None => None,
            Some(parent) => match self.stage(parent).selected_key.clone() {
                Some(key) => Some(key),
                None => return Err(SelectionError::NothingToRetry { stage, parent }),
            },
        };
        Ok(self.begin_fetch(stage, parent_key))
    }

    /// Applies a fetch result. Returns `false` when the result is stale, i.e. a
    /// newer fetch was issued for the stage or its parent selection changed
    /// since the request was made.
    pub fn apply_options(
        &mut self,
        stage: StageId,
        ticket: FetchTicket,
        parent_key: Option<&str>,
        result: Result<Vec<SelectOption>, String>,
    ) -> bool {
        let current_parent = stage
            .parent()
            .and_then(|parent| self.stage(parent).selected_key.as_deref());
        if current_parent != parent_key {
            engine_debug!(
                "Discarding {} options for parent {:?}; parent is now {:?}",
                stage,
                parent_key,
                current_parent
            );
            return false;
        }

        let target = &mut self.stages[stage.index()];
        if target.pending != Some(ticket) {
            engine_debug!(
                "Discarding {} options ticket={} (pending={:?})",
                stage,
                ticket,
                target.pending
            );
            return false;
        }

        target.pending = None;
        target.loading = false;
        match result {
            Ok(options) => {
                engine_info!("Loaded {} {} option(s)", options.len(), stage);
                target.options = options;
                target.error = None;
            }
            Err(message) => {
                target.options.clear();
                target.error = Some(message);
            }
        }
        true
    }

    /// Finds an option by key first, then by case-insensitive label.
    pub fn find_option(&self, stage: StageId, needle: &str) -> Option<&SelectOption> {
        let options = &self.stage(stage).options;
        options
            .iter()
            .find(|option| option.key == needle)
            .or_else(|| {
                options
                    .iter()
                    .find(|option| option.label.eq_ignore_ascii_case(needle))
            })
    }

    fn begin_fetch(&mut self, stage: StageId, parent_key: Option<String>) -> FetchRequest {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let target = &mut self.stages[stage.index()];
        target.reset();
        target.loading = true;
        target.pending = Some(ticket);
        self.invalidate_downstream(stage);

        FetchRequest {
            stage,
            parent_key,
            ticket,
        }
    }

    fn invalidate_downstream(&mut self, stage: StageId) {
        for downstream in &mut self.stages[stage.index() + 1..] {
            downstream.reset();
        }
    }
}
