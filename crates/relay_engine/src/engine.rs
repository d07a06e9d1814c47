use std::sync::Arc;
use std::time::Instant;

use engine_logging::{engine_debug, engine_warn};
use relay_core::{AlertToken, Effect, FetchRequest, IngestionRequest, Msg, ScheduledExpiry};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::{IngestionClient, OptionFetcher};

/// Executes core effects and reports their outcomes as messages.
///
/// Must be used from within a tokio runtime. Fetches run concurrently and
/// complete in any order; ordering is restored by the core's ticket checks.
pub struct EngineHandle {
    options: Arc<dyn OptionFetcher>,
    ingestion: Arc<dyn IngestionClient>,
    msg_tx: UnboundedSender<Msg>,
    alert_timer: Option<(AlertToken, JoinHandle<()>)>,
}

impl EngineHandle {
    pub fn new(
        options: Arc<dyn OptionFetcher>,
        ingestion: Arc<dyn IngestionClient>,
        msg_tx: UnboundedSender<Msg>,
    ) -> Self {
        Self {
            options,
            ingestion,
            msg_tx,
            alert_timer: None,
        }
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchOptions(request) => self.fetch_options(request),
                Effect::SubmitIngestion(request) => self.submit_ingestion(request),
                Effect::ScheduleAlertExpiry(expiry) => self.schedule_alert(expiry),
                Effect::CancelAlertExpiry { token } => self.cancel_alert(token),
            }
        }
    }

    fn fetch_options(&self, request: FetchRequest) {
        engine_debug!(
            "FetchOptions stage={} ticket={} parent={:?}",
            request.stage,
            request.ticket,
            request.parent_key
        );
        let fetcher = self.options.clone();
        let msg_tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let result = fetcher
                .fetch_options(request.stage, request.parent_key.as_deref())
                .await
                .map_err(|err| err.to_string());
            let _ = msg_tx.send(Msg::OptionsLoaded {
                stage: request.stage,
                ticket: request.ticket,
                parent_key: request.parent_key,
                result,
                at: Instant::now(),
            });
        });
    }

    fn submit_ingestion(&self, request: IngestionRequest) {
        let client = self.ingestion.clone();
        let msg_tx = self.msg_tx.clone();
        tokio::spawn(async move {
            let result = client.submit(&request).await.map_err(|err| {
                engine_warn!("Ingestion of {} failed: {}", request.channel_id, err);
                err.to_string()
            });
            let _ = msg_tx.send(Msg::IngestionFinished {
                result,
                at: Instant::now(),
            });
        });
    }

    /// Keeps exactly one pending expiry; a new alert aborts the old timer.
    fn schedule_alert(&mut self, expiry: ScheduledExpiry) {
        if let Some((_, handle)) = self.alert_timer.take() {
            handle.abort();
        }
        let msg_tx = self.msg_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(expiry.after).await;
            let _ = msg_tx.send(Msg::AlertExpired {
                token: expiry.token,
            });
        });
        self.alert_timer = Some((expiry.token, handle));
    }

    fn cancel_alert(&mut self, token: AlertToken) {
        if let Some((pending, handle)) = self.alert_timer.take() {
            if pending == token {
                handle.abort();
            } else {
                self.alert_timer = Some((pending, handle));
            }
        }
    }

    pub fn has_pending_alert(&self) -> bool {
        self.alert_timer
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished())
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.alert_timer.take() {
            handle.abort();
        }
    }
}
