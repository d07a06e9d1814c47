use crate::{AlertToken, FetchRequest, IngestionRequest, ScheduledExpiry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchOptions(FetchRequest),
    SubmitIngestion(IngestionRequest),
    ScheduleAlertExpiry(ScheduledExpiry),
    CancelAlertExpiry { token: AlertToken },
}
