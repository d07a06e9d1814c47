use std::time::Instant;

use engine_logging::{engine_info, engine_warn};

use crate::time_range;
use crate::{compose, AlertKind, AppState, Effect, IngestionStatus, Msg, StageId};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Initialize => {
            let request = state.selection.initialize();
            state.mark_dirty();
            vec![Effect::FetchOptions(request)]
        }
        Msg::StageSelected { stage, key, at } => match state.selection.select(stage, key.as_deref()) {
            Ok(request) => {
                state.mark_dirty();
                request.map(Effect::FetchOptions).into_iter().collect()
            }
            Err(err) => raise(&mut state, err.to_string(), AlertKind::Warning, at),
        },
        Msg::RetryStage { stage, at } => match state.selection.retry(stage) {
            Ok(request) => {
                state.mark_dirty();
                vec![Effect::FetchOptions(request)]
            }
            Err(err) => raise(&mut state, err.to_string(), AlertKind::Warning, at),
        },
        Msg::OptionsLoaded {
            stage,
            ticket,
            parent_key,
            result,
            at,
        } => {
            let failure = result.as_ref().err().cloned();
            if !state
                .selection
                .apply_options(stage, ticket, parent_key.as_deref(), result)
            {
                return (state, Vec::new());
            }
            state.mark_dirty();
            match failure {
                Some(message) => {
                    engine_warn!("Fetching {} options failed: {}", stage, message);
                    raise(
                        &mut state,
                        format!("Error fetching {} options", stage),
                        AlertKind::Error,
                        at,
                    )
                }
                None => Vec::new(),
            }
        }
        Msg::IngestClicked { now, at } => {
            if matches!(state.ingestion, IngestionStatus::Submitting(_)) {
                return raise_owned(state, "Ingestion already in progress", AlertKind::Warning, at);
            }
            let snapshot = state.selection.current_state();
            let since = snapshot
                .selected(StageId::TimeRange)
                .and_then(|token| time_range::resolve(token, now));
            match compose(&snapshot, since, state.policy) {
                Ok(request) => {
                    engine_info!(
                        "Submitting ingestion channel={} since={:?}",
                        request.channel_id,
                        request.since_timestamp_ms
                    );
                    state.ingestion = IngestionStatus::Submitting(request.clone());
                    state.mark_dirty();
                    vec![Effect::SubmitIngestion(request)]
                }
                Err(err) => raise(&mut state, err.to_string(), AlertKind::Warning, at),
            }
        }
        Msg::IngestionFinished { result, at } => {
            if !matches!(state.ingestion, IngestionStatus::Submitting(_)) {
                return (state, Vec::new());
            }
            state.mark_dirty();
            match result {
                Ok(()) => {
                    state.ingestion = IngestionStatus::Succeeded;
                    raise(
                        &mut state,
                        "Ingestion successful!".to_string(),
                        AlertKind::Success,
                        at,
                    )
                }
                Err(message) => {
                    engine_warn!("Ingestion failed: {}", message);
                    let alert = format!("Error during ingestion: {}", message);
                    state.ingestion = IngestionStatus::Failed(message);
                    raise(&mut state, alert, AlertKind::Error, at)
                }
            }
        }
        Msg::AlertRaised { message, kind, at } => raise(&mut state, message, kind, at),
        Msg::AlertExpired { token } => {
            if state.alerts.expire(token) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::AlertDismissed => match state.alerts.dismiss() {
            Some(token) => {
                state.mark_dirty();
                vec![Effect::CancelAlertExpiry { token }]
            }
            None => Vec::new(),
        },
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn raise(state: &mut AppState, message: String, kind: AlertKind, at: Instant) -> Vec<Effect> {
    engine_info!("Alert ({:?}): {}", kind, message);
    let expiry = state.alerts.show(message, kind, at);
    state.mark_dirty();
    vec![Effect::ScheduleAlertExpiry(expiry)]
}

fn raise_owned(
    mut state: AppState,
    message: &str,
    kind: AlertKind,
    at: Instant,
) -> (AppState, Vec<Effect>) {
    let effects = raise(&mut state, message.to_string(), kind, at);
    (state, effects)
}
