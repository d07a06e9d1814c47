use engine_logging::{engine_info, engine_warn};
use futures_util::StreamExt;
use relay_core::{ChatError, ChatExchange, ChatStatus, FilterMetadata};

use crate::{ChatTransport, FailureKind};

/// Change hook for a running exchange.
pub trait ExchangeObserver: Send + Sync {
    /// The buffered answer grew. Called once per non-empty chunk decode.
    fn on_update(&self, exchange: &ChatExchange);

    /// The exchange changed status.
    fn on_status(&self, _exchange: &ChatExchange) {}
}

/// Drives one question/answer exchange at a time over a [`ChatTransport`],
/// folding the chunk stream into a [`ChatExchange`].
pub struct StreamConsumer<T> {
    transport: T,
    exchange: ChatExchange,
}

impl<T: ChatTransport> StreamConsumer<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            exchange: ChatExchange::new(),
        }
    }

    pub fn exchange(&self) -> &ChatExchange {
        &self.exchange
    }

    /// Submits `question` and reads the answer to completion.
    ///
    /// Only a blank question is an `Err`; transport failures end in
    /// `ChatStatus::Failed` with whatever was received kept in the buffer.
    pub async fn ask(
        &mut self,
        question: &str,
        filter: Vec<FilterMetadata>,
        observer: &dyn ExchangeObserver,
    ) -> Result<ChatStatus, ChatError> {
        let id = self.exchange.submit(question)?;
        observer.on_status(&self.exchange);

        let request = self.exchange.request(filter);
        let mut stream = match self.transport.open(&request).await {
            Ok(stream) => stream,
            Err(err) => {
                engine_warn!("Chat request {} failed: {}", id, err);
                if matches!(err.kind, FailureKind::HttpStatus(_)) {
                    self.exchange.reject(id, err.to_string());
                } else {
                    self.exchange.fail(id, err.to_string());
                }
                observer.on_status(&self.exchange);
                return Ok(self.exchange.status());
            }
        };

        self.exchange.begin_streaming(id);
        observer.on_status(&self.exchange);

        let mut received = 0usize;
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    received += bytes.len();
                    if self.exchange.append_chunk(id, &bytes) {
                        observer.on_update(&self.exchange);
                    }
                }
                Err(err) => {
                    engine_warn!(
                        "Chat stream {} broke after {} bytes: {}",
                        id,
                        received,
                        err
                    );
                    self.exchange.fail(id, err.to_string());
                    observer.on_status(&self.exchange);
                    return Ok(self.exchange.status());
                }
            }
        }

        if self.exchange.finish(id) {
            observer.on_update(&self.exchange);
        }
        engine_info!("Chat stream {} complete ({} bytes)", id, received);
        observer.on_status(&self.exchange);
        Ok(self.exchange.status())
    }
}
