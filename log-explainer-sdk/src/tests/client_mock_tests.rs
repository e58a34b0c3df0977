//! Mock tests for the explainer client
//!
//! These tests use WireMock to simulate the explainer API and verify the
//! stream-first flow, the single-shot fallback and failure classification.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::core::{ClientBuilder, MockSessionObserver, NoopObserver, ServiceClient};
    use crate::error::classify::{
        TITLE_AUTHENTICATION, TITLE_RATE_LIMITED, TITLE_SERVER, TITLE_UNEXPECTED,
        TITLE_UNREACHABLE,
    };
    use crate::error::ServiceError;
    use crate::services::explainer::{
        deadline, AnalysisOutcome, AnalysisRequest, AnalyzeOptions, ExplainerClient,
        TransportKind,
    };
    use crate::session::{AnalysisSession, SessionUpdate};

    const EVENT_STREAM: &str = "text/event-stream";

    /// Sets up a mock explainer server
    async fn setup_mock_server() -> MockServer {
        MockServer::start().await
    }

    /// Creates a test client configured to use the mock server
    fn create_test_client(mock_server: &MockServer) -> ExplainerClient {
        ClientBuilder::new()
            .base_url(mock_server.uri())
            .build()
            .expect("Failed to build explainer client")
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::new("ERROR db timeout after 30000ms", "orders service")
    }

    fn options() -> AnalyzeOptions {
        AnalyzeOptions {
            timeout: Some(Duration::from_secs(5)),
            ..AnalyzeOptions::default()
        }
    }

    fn final_body() -> serde_json::Value {
        json!({
            "raw_llm": "Connection pool exhausted",
            "parsed": {
                "summary": "The database pool ran out of connections",
                "severity": "high",
                "confidence_score": 82
            }
        })
    }

    async fn run(
        client: &ExplainerClient,
        request: &AnalysisRequest,
        options: &AnalyzeOptions,
    ) -> (AnalysisOutcome, AnalysisSession, Vec<SessionUpdate>) {
        let mut session = AnalysisSession::new();
        let mut updates = Vec::new();
        let mut observer = |update: &SessionUpdate| updates.push(update.clone());
        let cancel = CancellationToken::new();

        let outcome = client
            .analyze(request, options, &mut session, &mut observer, &cancel)
            .await;

        (outcome, session, updates)
    }

    #[tokio::test]
    async fn test_stream_success() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        let body = format!(
            "event: status\ndata: {{\"step\": 1, \"message\": \"Reading log\"}}\n\n\
event: chunk\ndata: {{\"content\": \"Connection \"}}\n\n\
event: chunk\ndata: {{\"content\": \"pool exhausted\"}}\n\n\
event: final\ndata: {}\n\n",
            final_body()
        );

        Mock::given(method("POST"))
            .and(path("/explain/stream"))
            .and(header("accept", EVENT_STREAM))
            .and(header_exists("x-request-id"))
            .and(body_json(json!({
                "raw_log": "ERROR db timeout after 30000ms",
                "context": "orders service"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, EVENT_STREAM))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/explain"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let (outcome, session, updates) = run(&client, &request(), &options()).await;

        let result = outcome.result().expect("analysis should complete");
        let parsed = result.parsed.as_ref().unwrap();
        assert_eq!(parsed.severity(), Some("high"));
        assert_eq!(parsed.confidence(), Some(82.0));

        assert_eq!(session.partial_output(), "Connection pool exhausted");
        assert_eq!(session.transport(), Some(TransportKind::Stream));
        assert!(!session.is_streaming());
        assert!(!session.is_loading());

        assert_eq!(
            updates.first(),
            Some(&SessionUpdate::Started {
                transport: TransportKind::Stream
            })
        );
        assert_eq!(updates.last(), Some(&SessionUpdate::Completed));
        assert!(!updates.contains(&SessionUpdate::FallingBack));
    }

    #[tokio::test]
    async fn test_fallback_when_stream_endpoint_missing() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        Mock::given(method("POST"))
            .and(path("/explain/stream"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not Found"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/explain"))
            .and(header_exists("x-request-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(final_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let (outcome, session, updates) = run(&client, &request(), &options()).await;

        assert!(outcome.is_completed());
        assert_eq!(session.transport(), Some(TransportKind::SingleShot));
        assert_eq!(
            updates,
            vec![
                SessionUpdate::Started {
                    transport: TransportKind::Stream
                },
                SessionUpdate::FallingBack,
                SessionUpdate::Started {
                    transport: TransportKind::SingleShot
                },
                SessionUpdate::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_fallback_failure_is_classified() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        Mock::given(method("POST"))
            .and(path("/explain/stream"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/explain"))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(json!({"detail": "Too many requests"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let (outcome, session, _) = run(&client, &request(), &options()).await;

        let error = outcome.error().expect("analysis should fail");
        assert_eq!(error.title, TITLE_RATE_LIMITED);
        assert_eq!(session.error(), Some(error));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_single_shot_only() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        Mock::given(method("POST"))
            .and(path("/explain/stream"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/explain"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid API key"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let options = AnalyzeOptions {
            prefer_stream: false,
            ..options()
        };
        let (outcome, _, _) = run(&client, &request(), &options).await;

        assert_eq!(outcome.error().map(|e| e.title.as_str()), Some(TITLE_AUTHENTICATION));
    }

    #[tokio::test]
    async fn test_stream_error_event_does_not_fall_back() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        let body = "event: chunk\ndata: {\"content\": \"Look\"}\n\n\
event: error\ndata: {\"message\": \"Upstream model returned server error\"}\n\n";

        Mock::given(method("POST"))
            .and(path("/explain/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, EVENT_STREAM))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/explain"))
            .respond_with(ResponseTemplate::new(200).set_body_json(final_body()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let (outcome, session, _) = run(&client, &request(), &options()).await;

        assert_eq!(outcome.error().map(|e| e.title.as_str()), Some(TITLE_SERVER));
        assert_eq!(session.partial_output(), "Look");
    }

    #[tokio::test]
    async fn test_stream_without_final_uses_partial_output() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        let body = "event: chunk\ndata: {\"content\": \"Partial \"}\n\n\
event: chunk\ndata: {\"content\": \"answer\"}";

        Mock::given(method("POST"))
            .and(path("/explain/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, EVENT_STREAM))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/explain"))
            .respond_with(ResponseTemplate::new(200).set_body_json(final_body()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let (outcome, _, _) = run(&client, &request(), &options()).await;

        let result = outcome.result().expect("partial output should become the result");
        assert_eq!(result.raw_text(), Some("Partial answer"));
        assert!(result.parsed.is_none());
    }

    #[tokio::test]
    async fn test_empty_stream_falls_back() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        Mock::given(method("POST"))
            .and(path("/explain/stream"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("event: status\ndata: {\"step\": 1}\n\n", EVENT_STREAM),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/explain"))
            .respond_with(ResponseTemplate::new(200).set_body_json(final_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let (outcome, session, _) = run(&client, &request(), &options()).await;

        assert!(outcome.is_completed());
        assert_eq!(session.transport(), Some(TransportKind::SingleShot));
    }

    #[tokio::test]
    async fn test_invalid_single_shot_body() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        Mock::given(method("POST"))
            .and(path("/explain"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let options = AnalyzeOptions {
            prefer_stream: false,
            ..options()
        };
        let (outcome, _, _) = run(&client, &request(), &options).await;

        assert_eq!(outcome.error().map(|e| e.title.as_str()), Some(TITLE_UNEXPECTED));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let client = ClientBuilder::new()
            .base_url("http://127.0.0.1:1")
            .build()
            .unwrap();

        let (outcome, session, updates) = run(&client, &request(), &options()).await;

        assert_eq!(outcome.error().map(|e| e.title.as_str()), Some(TITLE_UNREACHABLE));
        assert!(updates.contains(&SessionUpdate::FallingBack));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_timeout_is_classified_as_unreachable() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(final_body())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let options = AnalyzeOptions {
            timeout: Some(Duration::from_millis(200)),
            ..AnalyzeOptions::default()
        };
        let (outcome, _, _) = run(&client, &request(), &options).await;

        assert_eq!(outcome.error().map(|e| e.title.as_str()), Some(TITLE_UNREACHABLE));
    }

    #[test]
    fn test_sub_second_deadline_is_reported_in_millis() {
        let error = tokio_test::block_on(deadline(Some(Duration::from_millis(250))));

        assert!(matches!(error, ServiceError::Timeout(_)));
        assert_eq!(error.to_string(), "Timeout error: No result within 250ms");
    }

    #[tokio::test]
    async fn test_cancellation() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(final_body())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let mut session = AnalysisSession::new();
        let outcome = client
            .analyze(&request(), &options(), &mut session, &mut NoopObserver, &cancel)
            .await;

        assert_eq!(outcome, AnalysisOutcome::Cancelled);
        assert!(session.is_cancelled());
        assert!(session.error().is_none());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_empty_log_issues_no_request() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(final_body()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let mut observer = MockSessionObserver::new();
        observer.expect_on_update().never();

        let mut session = AnalysisSession::new();
        let outcome = client
            .analyze(
                &AnalysisRequest::new("  \n\t ", "context only"),
                &options(),
                &mut session,
                &mut observer,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome, AnalysisOutcome::Skipped);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_observer_sees_every_stream_update() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        let body = format!(
            "event: status\ndata: {{\"step\": 2}}\n\n\
event: chunk\ndata: {{\"content\": \"x\"}}\n\n\
event: final\ndata: {}\n\n",
            final_body()
        );

        Mock::given(method("POST"))
            .and(path("/explain/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, EVENT_STREAM))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let mut observer = MockSessionObserver::new();
        observer
            .expect_on_update()
            .withf(|update| {
                !matches!(
                    update,
                    SessionUpdate::FallingBack | SessionUpdate::Failed(_) | SessionUpdate::Cancelled
                )
            })
            .times(4)
            .return_const(());

        let mut session = AnalysisSession::new();
        let outcome = client
            .analyze(
                &request(),
                &options(),
                &mut session,
                &mut observer,
                &CancellationToken::new(),
            )
            .await;

        assert!(outcome.is_completed());
    }

    #[tokio::test]
    async fn test_redaction_applies_before_sending() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        Mock::given(method("POST"))
            .and(path("/explain"))
            .and(body_json(json!({
                "raw_log": "login failed password: *** for [REDACTED_EMAIL]",
                "context": "token: ***"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(final_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        let request = AnalysisRequest::new(
            "login failed password=hunter2 for ops@example.com",
            "token=abc123",
        );
        let options = AnalyzeOptions {
            redact: true,
            prefer_stream: false,
            ..options()
        };
        let (outcome, _, _) = run(&client, &request, &options).await;

        assert!(outcome.is_completed());
    }

    #[tokio::test]
    async fn test_health_check() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(client.health_check().await.unwrap());
        assert_eq!(client.name(), "explainer");
        assert_eq!(client.base_url(), mock_server.uri());
    }

    #[tokio::test]
    async fn test_health_check_unhealthy() {
        // Setup mock server
        let mock_server = setup_mock_server().await;

        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server);
        assert!(!client.health_check().await.unwrap());
    }
}
