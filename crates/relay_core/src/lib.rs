//! Relay core: pure selection, composition, chat and alert state machines.
mod alert;
mod chat;
mod compose;
mod effect;
mod msg;
mod selection;
mod state;
pub mod time_range;
mod update;
mod view_model;

pub use alert::{AlertKind, AlertState, AlertTimer, AlertToken, ScheduledExpiry, ALERT_DURATION};
pub use chat::{
    ChatError, ChatExchange, ChatRequest, ChatStatus, ExchangeId, FilterMetadata,
    FilterParseError, FilterValue,
};
pub use compose::{compose, ComposeError, IngestionRequest, TimeRangePolicy, REQUIRED_STAGES};
pub use effect::Effect;
pub use msg::Msg;
pub use selection::{
    FetchRequest, FetchTicket, SelectOption, SelectionController, SelectionError,
    SelectionSnapshot, SelectionStage, StageId,
};
pub use state::{AppState, IngestionStatus};
pub use time_range::{TimeRangeToken, UnknownTimeRange};
pub use update::update;
pub use view_model::{AlertView, AppViewModel, StageView};
