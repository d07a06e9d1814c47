use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use relay_core::{ChatExchange, ChatStatus, FilterMetadata, IngestionRequest, SelectOption, StageId};
use relay_engine::{
    BackendSettings, ExchangeObserver, FailureKind, HttpBackend, IngestionClient, OptionFetcher,
    StreamConsumer,
};
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&BackendSettings {
        base_url: server.uri(),
        ..BackendSettings::default()
    })
    .expect("backend")
}

struct Silent;

impl ExchangeObserver for Silent {
    fn on_update(&self, _exchange: &ChatExchange) {}
}

#[tokio::test]
async fn teams_are_mapped_to_options() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mattermost/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "t1", "name": "platform", "display_name": "Platform Team"},
            {"id": "t2", "name": "payments", "display_name": ""},
            {"id": "t3"}
        ])))
        .mount(&server)
        .await;

    let options = backend(&server)
        .fetch_options(StageId::Team, None)
        .await
        .expect("teams");
    assert_eq!(
        options,
        vec![
            SelectOption::new("t1", "Platform Team"),
            SelectOption::new("t2", "payments"),
            SelectOption::new("t3", "t3"),
        ]
    );
}

#[tokio::test]
async fn channels_are_filtered_to_the_selected_team() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mattermost/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "c1", "name": "town-square", "team_id": "t1"},
            {"id": "c2", "name": "off-topic", "team_id": "t2"},
            {"id": "c3", "name": "releases", "display_name": "Releases", "team_id": "t1"},
            {"id": "c4", "name": "orphan"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let options = backend(&server)
        .fetch_options(StageId::Channel, Some("t1"))
        .await
        .expect("channels");
    assert_eq!(
        options,
        vec![
            SelectOption::new("c1", "town-square"),
            SelectOption::new("c3", "Releases"),
        ]
    );
}

#[tokio::test]
async fn time_ranges_need_no_request() {
    init_logging();
    let server = MockServer::start().await;
    let options = backend(&server)
        .fetch_options(StageId::TimeRange, Some("c1"))
        .await
        .expect("ranges");
    assert_eq!(options.len(), 20);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn option_fetch_surfaces_http_status_and_bad_json() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mattermost/teams"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/mattermost/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let err = backend.fetch_options(StageId::Team, None).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(401));
    let err = backend
        .fetch_options(StageId::Channel, Some("t1"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn ingest_sends_channel_and_since_as_query() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/mattermost/ingest"))
        .and(query_param("channelId", "c1"))
        .and(query_param("since", "1700000000000"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server)
        .submit(&IngestionRequest {
            channel_id: "c1".to_string(),
            since_timestamp_ms: Some(1_700_000_000_000),
        })
        .await
        .expect("ingest ok");
}

#[tokio::test]
async fn ingest_without_range_omits_since_and_reports_failure() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/mattermost/ingest"))
        .and(query_param("channelId", "c1"))
        .and(query_param_is_missing("since"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend(&server)
        .submit(&IngestionRequest {
            channel_id: "c1".to_string(),
            since_timestamp_ms: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
}

#[tokio::test]
async fn chat_streams_answer_for_posted_question() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/mattermost/stream/chat"))
        .and(body_json(serde_json::json!({
            "question": "What shipped?",
            "filter": [{"key": "channel", "value": "releases"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("Version **2.1** shipped."))
        .mount(&server)
        .await;

    let mut consumer = StreamConsumer::new(backend(&server));
    let filter = vec!["channel=releases".parse::<FilterMetadata>().unwrap()];
    let status = consumer.ask("What shipped?", filter, &Silent).await.unwrap();

    assert_eq!(status, ChatStatus::Complete);
    assert_eq!(consumer.exchange().buffered_answer(), "Version **2.1** shipped.");
}

#[tokio::test]
async fn chat_rejection_marks_exchange_failed() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/mattermost/stream/chat"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut consumer = StreamConsumer::new(backend(&server));
    let status = consumer.ask("anyone?", Vec::new(), &Silent).await.unwrap();

    assert_eq!(status, ChatStatus::Failed);
    assert_eq!(consumer.exchange().buffered_answer(), "");
}

#[tokio::test]
async fn slow_backend_times_out() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/mattermost/teams"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(serde_json::json!([])),
        )
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&BackendSettings {
        base_url: server.uri(),
        request_timeout: Duration::from_millis(50),
        ..BackendSettings::default()
    })
    .unwrap();
    let err = backend.fetch_options(StageId::Team, None).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = HttpBackend::new(&BackendSettings {
        base_url: "not a url".to_string(),
        ..BackendSettings::default()
    })
    .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
