use std::fmt;
use std::str::FromStr;

use encoding_rs::{CoderResult, Decoder, UTF_8};
use serde::{Deserialize, Serialize};

pub type ExchangeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatStatus {
    #[default]
    Idle,
    Sending,
    Streaming,
    Complete,
    Failed,
}

impl ChatStatus {
    pub fn is_in_flight(self) -> bool {
        matches!(self, ChatStatus::Sending | ChatStatus::Streaming)
    }
}

/// Metadata restriction applied by the backend's document retriever:
/// a single value means equality, a list means membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterMetadata {
    pub key: String,
    pub value: FilterValue,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("filter '{0}' must look like key=value or key=a,b")]
pub struct FilterParseError(pub String);

impl FromStr for FilterMetadata {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, raw) = s
            .split_once('=')
            .ok_or_else(|| FilterParseError(s.to_owned()))?;
        let key = key.trim();
        if key.is_empty() || raw.trim().is_empty() {
            return Err(FilterParseError(s.to_owned()));
        }
        let value = if raw.contains(',') {
            FilterValue::Many(
                raw.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(ToOwned::to_owned)
                    .collect(),
            )
        } else {
            FilterValue::One(raw.trim().to_owned())
        };
        Ok(Self {
            key: key.to_owned(),
            value,
        })
    }
}

/// JSON body of a chat submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub question: String,
    pub filter: Vec<FilterMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Please enter a question")]
    EmptyQuestion,
}

/// Incremental UTF-8 decoder; an incomplete trailing sequence is held back
/// until the next chunk completes it.
struct Utf8Stream {
    decoder: Decoder,
}

impl Utf8Stream {
    fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_without_bom_handling(),
        }
    }

    fn decode(&mut self, mut bytes: &[u8], last: bool) -> String {
        let mut out = String::new();
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(bytes.len())
                .unwrap_or(bytes.len().saturating_mul(3).saturating_add(4));
            out.reserve(needed);
            let (result, read, _) = self.decoder.decode_to_string(bytes, &mut out, last);
            bytes = &bytes[read..];
            match result {
                CoderResult::InputEmpty => return out,
                CoderResult::OutputFull => continue,
            }
        }
    }
}

/// One question and its streamed answer.
///
/// Events for an exchange are tagged with its [`ExchangeId`]; submitting a new
/// question bumps the id so late events from a superseded stream are ignored.
pub struct ChatExchange {
    id: ExchangeId,
    question: String,
    buffered_answer: String,
    status: ChatStatus,
    failure: Option<String>,
    decoder: Utf8Stream,
}

impl fmt::Debug for ChatExchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatExchange")
            .field("id", &self.id)
            .field("question", &self.question)
            .field("buffered_answer", &self.buffered_answer)
            .field("status", &self.status)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

impl Default for ChatExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatExchange {
    pub fn new() -> Self {
        Self {
            id: 0,
            question: String::new(),
            buffered_answer: String::new(),
            status: ChatStatus::Idle,
            failure: None,
            decoder: Utf8Stream::new(),
        }
    }

    pub fn id(&self) -> ExchangeId {
        self.id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn buffered_answer(&self) -> &str {
        &self.buffered_answer
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Starts a new exchange. Blank questions are rejected without touching
    /// the current exchange.
    pub fn submit(&mut self, question: &str) -> Result<ExchangeId, ChatError> {
        if question.trim().is_empty() {
            return Err(ChatError::EmptyQuestion);
        }
        self.id += 1;
        self.question = question.to_owned();
        self.buffered_answer.clear();
        self.status = ChatStatus::Sending;
        self.failure = None;
        self.decoder = Utf8Stream::new();
        Ok(self.id)
    }

    pub fn request(&self, filter: Vec<FilterMetadata>) -> ChatRequest {
        ChatRequest {
            question: self.question.clone(),
            filter,
        }
    }

    /// Response headers arrived with a success status.
    pub fn begin_streaming(&mut self, id: ExchangeId) -> bool {
        if id != self.id || self.status != ChatStatus::Sending {
            return false;
        }
        self.status = ChatStatus::Streaming;
        true
    }

    /// Response headers arrived with a non-success status.
    pub fn reject(&mut self, id: ExchangeId, reason: impl Into<String>) -> bool {
        if id != self.id || self.status != ChatStatus::Sending {
            return false;
        }
        self.status = ChatStatus::Failed;
        self.failure = Some(reason.into());
        true
    }

    /// Appends a chunk. Returns `true` only when the decoded text was non-empty,
    /// i.e. when a render is warranted.
    pub fn append_chunk(&mut self, id: ExchangeId, bytes: &[u8]) -> bool {
        if id != self.id || self.status != ChatStatus::Streaming {
            return false;
        }
        let text = self.decoder.decode(bytes, false);
        self.push_text(&text)
    }

    /// End of stream. Any dangling partial sequence is flushed as U+FFFD;
    /// returns `true` when that flush changed the buffer.
    pub fn finish(&mut self, id: ExchangeId) -> bool {
        if id != self.id || self.status != ChatStatus::Streaming {
            return false;
        }
        let tail = self.decoder.decode(&[], true);
        let changed = self.push_text(&tail);
        self.status = ChatStatus::Complete;
        changed
    }

    /// Transport failure before or during the stream. Accumulated text is kept.
    pub fn fail(&mut self, id: ExchangeId, reason: impl Into<String>) -> bool {
        if id != self.id || !self.status.is_in_flight() {
            return false;
        }
        self.status = ChatStatus::Failed;
        self.failure = Some(reason.into());
        true
    }

    fn push_text(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.buffered_answer.push_str(text);
        true
    }
}
