use std::sync::{Mutex, Once};

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use pretty_assertions::assert_eq;
use relay_core::{ChatError, ChatExchange, ChatRequest, ChatStatus};
use relay_engine::{
    ChatTransport, ChunkStream, ExchangeObserver, FailureKind, StreamConsumer, TransportError,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn ok(bytes: &'static [u8]) -> Result<&'static [u8], FailureKind> {
    Ok(bytes)
}

/// Replays a fixed script of chunks, or fails before any headers arrive.
struct ScriptedTransport {
    script: Result<Vec<Result<&'static [u8], FailureKind>>, FailureKind>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    fn chunks(chunks: Vec<Result<&'static [u8], FailureKind>>) -> Self {
        Self {
            script: Ok(chunks),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn refusing(kind: FailureKind) -> Self {
        Self {
            script: Err(kind),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.script {
            Err(kind) => Err(TransportError {
                kind: kind.clone(),
                message: "refused".to_string(),
            }),
            Ok(chunks) => {
                let items: Vec<Result<Bytes, TransportError>> = chunks
                    .iter()
                    .map(|chunk| match chunk {
                        Ok(bytes) => Ok(Bytes::from_static(*bytes)),
                        Err(kind) => Err(TransportError {
                            kind: kind.clone(),
                            message: "connection reset".to_string(),
                        }),
                    })
                    .collect();
                Ok(stream::iter(items).boxed())
            }
        }
    }
}

#[derive(Default)]
struct Recorder {
    updates: Mutex<Vec<String>>,
    statuses: Mutex<Vec<ChatStatus>>,
}

impl ExchangeObserver for Recorder {
    fn on_update(&self, exchange: &ChatExchange) {
        self.updates
            .lock()
            .unwrap()
            .push(exchange.buffered_answer().to_string());
    }

    fn on_status(&self, exchange: &ChatExchange) {
        self.statuses.lock().unwrap().push(exchange.status());
    }
}

#[tokio::test]
async fn chunks_fold_into_buffer_with_one_notification_each() {
    init_logging();
    let transport = ScriptedTransport::chunks(vec![ok(b"Hel"), ok(b"lo, "), ok(b"world")]);
    let mut consumer = StreamConsumer::new(transport);
    let recorder = Recorder::default();

    let status = consumer.ask("say hi", Vec::new(), &recorder).await.unwrap();

    assert_eq!(status, ChatStatus::Complete);
    assert_eq!(consumer.exchange().buffered_answer(), "Hello, world");
    assert_eq!(
        *recorder.updates.lock().unwrap(),
        vec!["Hel", "Hello, ", "Hello, world"]
    );
    assert_eq!(
        *recorder.statuses.lock().unwrap(),
        vec![ChatStatus::Sending, ChatStatus::Streaming, ChatStatus::Complete]
    );
}

#[tokio::test]
async fn empty_chunks_do_not_notify() {
    init_logging();
    let transport = ScriptedTransport::chunks(vec![ok(b""), ok(b"a"), ok(b""), ok(b"b")]);
    let mut consumer = StreamConsumer::new(transport);
    let recorder = Recorder::default();

    consumer.ask("q", Vec::new(), &recorder).await.unwrap();
    assert_eq!(*recorder.updates.lock().unwrap(), vec!["a", "ab"]);
}

#[tokio::test]
async fn split_code_fence_and_multibyte_arrive_intact() {
    init_logging();
    // "```rs\nlet π = 3;\n```" split inside the fence marker and inside π.
    let transport = ScriptedTransport::chunks(vec![
        ok(b"``"),
        ok(b"`rs\nlet \xCF"),
        ok(b"\x80 = 3;\n`"),
        ok(b"``"),
    ]);
    let mut consumer = StreamConsumer::new(transport);
    let recorder = Recorder::default();

    consumer.ask("q", Vec::new(), &recorder).await.unwrap();
    assert_eq!(
        consumer.exchange().buffered_answer(),
        "```rs\nlet \u{3C0} = 3;\n```"
    );
}

#[tokio::test]
async fn mid_stream_failure_preserves_partial_answer() {
    init_logging();
    let transport =
        ScriptedTransport::chunks(vec![ok(b"partial "), Err(FailureKind::Network), ok(b"never")]);
    let mut consumer = StreamConsumer::new(transport);
    let recorder = Recorder::default();

    let status = consumer.ask("q", Vec::new(), &recorder).await.unwrap();

    assert_eq!(status, ChatStatus::Failed);
    assert_eq!(consumer.exchange().buffered_answer(), "partial ");
    assert!(consumer.exchange().failure().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn rejected_status_fails_with_empty_buffer() {
    init_logging();
    let mut consumer = StreamConsumer::new(ScriptedTransport::refusing(FailureKind::HttpStatus(500)));
    let recorder = Recorder::default();

    let status = consumer.ask("q", Vec::new(), &recorder).await.unwrap();

    assert_eq!(status, ChatStatus::Failed);
    assert_eq!(consumer.exchange().buffered_answer(), "");
    assert!(recorder.updates.lock().unwrap().is_empty());
    assert_eq!(
        *recorder.statuses.lock().unwrap(),
        vec![ChatStatus::Sending, ChatStatus::Failed]
    );
}

#[tokio::test]
async fn blank_question_makes_no_request() {
    init_logging();
    let transport = ScriptedTransport::chunks(vec![ok(b"unused")]);
    let mut consumer = StreamConsumer::new(transport);
    let recorder = Recorder::default();

    let err = consumer.ask("   ", Vec::new(), &recorder).await.unwrap_err();
    assert_eq!(err, ChatError::EmptyQuestion);
    assert_eq!(consumer.exchange().status(), ChatStatus::Idle);
    assert!(recorder.statuses.lock().unwrap().is_empty());
}

#[tokio::test]
async fn next_question_starts_from_an_empty_buffer() {
    init_logging();
    let transport = ScriptedTransport::chunks(vec![ok(b"answer")]);
    let mut consumer = StreamConsumer::new(transport);
    let recorder = Recorder::default();

    consumer.ask("first", Vec::new(), &recorder).await.unwrap();
    consumer.ask("second", Vec::new(), &recorder).await.unwrap();

    assert_eq!(consumer.exchange().question(), "second");
    assert_eq!(consumer.exchange().buffered_answer(), "answer");
}
