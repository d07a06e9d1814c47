use std::mem;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use engine_logging::engine_debug;
use relay_core::{
    update, AlertKind, AppState, IngestionStatus, Msg, StageId, TimeRangePolicy,
};
use relay_engine::{EngineHandle, HttpBackend};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::render;

/// Message loop between the core state and the engine, rendering alerts to
/// stderr as they appear.
pub struct Session {
    state: AppState,
    engine: EngineHandle,
    rx: UnboundedReceiver<Msg>,
    shown_alert: Option<String>,
}

impl Session {
    pub fn new(backend: Arc<HttpBackend>, policy: TimeRangePolicy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::with_policy(policy),
            engine: EngineHandle::new(backend.clone(), backend, tx),
            rx,
            shown_alert: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, msg: Msg) {
        engine_debug!("dispatch {:?}", msg);
        let state = mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        if self.state.consume_dirty() {
            self.render_alert();
        }
        self.engine.enqueue(effects);
    }

    pub fn alert(&mut self, message: impl Into<String>, kind: AlertKind) {
        self.dispatch(Msg::AlertRaised {
            message: message.into(),
            kind,
            at: Instant::now(),
        });
    }

    /// Waits for the stage's fetch to finish; a fetch error becomes an `Err`.
    pub async fn settle(&mut self, stage: StageId) -> Result<()> {
        while self.state.selection().stage(stage).loading {
            self.pump().await?;
        }
        match &self.state.selection().stage(stage).error {
            Some(error) => bail!("{stage} options unavailable: {error}"),
            None => Ok(()),
        }
    }

    /// Selects an option by id or label and waits for the next stage to load.
    pub async fn choose(&mut self, stage: StageId, needle: &str) -> Result<()> {
        let key = self
            .state
            .selection()
            .find_option(stage, needle)
            .map(|option| option.key.clone());
        let Some(key) = key else {
            // Let the controller reject it so the user sees the alert.
            self.dispatch(Msg::StageSelected {
                stage,
                key: Some(needle.to_owned()),
                at: Instant::now(),
            });
            bail!("no {stage} matches '{needle}'");
        };

        self.dispatch(Msg::StageSelected {
            stage,
            key: Some(key),
            at: Instant::now(),
        });
        match stage.child() {
            Some(child) => self.settle(child).await,
            None => Ok(()),
        }
    }

    pub async fn load_root(&mut self) -> Result<()> {
        self.dispatch(Msg::Initialize);
        self.settle(StageId::Team).await
    }

    /// Composes and submits the ingestion, waiting for the backend's answer.
    pub async fn ingest(&mut self) -> Result<()> {
        self.dispatch(Msg::IngestClicked {
            now: Utc::now(),
            at: Instant::now(),
        });
        while matches!(self.state.ingestion(), IngestionStatus::Submitting(_)) {
            self.pump().await?;
        }
        match self.state.ingestion() {
            IngestionStatus::Succeeded => Ok(()),
            IngestionStatus::Failed(message) => bail!("ingestion failed: {message}"),
            IngestionStatus::Idle | IngestionStatus::Submitting(_) => {
                let reason = self
                    .state
                    .alerts()
                    .current()
                    .map(|alert| alert.message.clone())
                    .unwrap_or_else(|| "ingestion was not submitted".to_string());
                Err(anyhow!(reason))
            }
        }
    }

    async fn pump(&mut self) -> Result<()> {
        let msg = self
            .rx
            .recv()
            .await
            .ok_or_else(|| anyhow!("engine stopped"))?;
        self.dispatch(msg);
        Ok(())
    }

    fn render_alert(&mut self) {
        let alert = self.state.view().alert;
        let line = alert.as_ref().map(render::alert_line);
        if line != self.shown_alert {
            if let Some(line) = &line {
                eprintln!("{line}");
            }
            self.shown_alert = line;
        }
    }
}
