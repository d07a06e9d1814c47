//! Relay engine: HTTP transport and effect execution.
mod chat;
mod consumer;
mod engine;
mod http;
mod ingest;
mod options;
mod types;

pub use chat::{ChatTransport, ChunkStream};
pub use consumer::{ExchangeObserver, StreamConsumer};
pub use engine::EngineHandle;
pub use http::{BackendSettings, HttpBackend};
pub use ingest::IngestionClient;
pub use options::OptionFetcher;
pub use types::{FailureKind, TransportError};
