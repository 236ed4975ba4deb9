//! HTTP engine behavior against a local mock server.

use patrol::capability::http::{HttpProvider, HttpSession};
use patrol::capability::{LoadOutcome, Session, SessionProvider};
use patrol::config::Target;
use patrol::error::ErrorKind;
use patrol::shutdown::CancelToken;
use patrol::visit::{visit, VisitOutcome};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session(timeout_secs: u64) -> HttpSession {
    HttpSession::new(Duration::from_secs(timeout_secs), Duration::ZERO).unwrap()
}

#[tokio::test]
async fn extracts_status_size_and_title() {
    let server = MockServer::start().await;
    let body = "<html><head><title> Warm Page </title></head><body>ok</body></html>";
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let mut session = session(5);
    let outcome = session
        .load(&server.uri(), &CancelToken::new())
        .await
        .unwrap();

    match outcome {
        LoadOutcome::Complete(info) => {
            assert_eq!(info.status, Some(200));
            assert_eq!(info.title.as_deref(), Some("Warm Page"));
            assert_eq!(info.body_bytes, Some(body.len() as u64));
            assert!(info.final_url.unwrap().starts_with(&server.uri()));
        }
        LoadOutcome::Interrupted => panic!("unexpected interrupt"),
    }
}

#[tokio::test]
async fn non_success_status_still_yields_a_successful_visit_with_dwell() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>gone</html>"))
        .mount(&server)
        .await;

    let provider = HttpProvider::new(Duration::from_secs(5), Duration::ZERO);
    let mut session = provider.acquire().await.unwrap();
    let target = Target {
        url: server.uri(),
        dwell: Duration::from_secs(1),
    };

    let started = Instant::now();
    let result = visit(session.as_mut(), &target, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(result.outcome, VisitOutcome::Success);
    // The full dwell ran despite the 404.
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn slow_responses_are_classified_as_timeouts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let mut session = HttpSession::new(Duration::from_millis(500), Duration::ZERO).unwrap();
    let err = session
        .load(&server.uri(), &CancelToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn unreachable_targets_are_classified_as_connection_errors() {
    // Grab a local port, then free it so the connect is refused.
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let mut session = session(2);
    let err = session.load(&uri, &CancelToken::new()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn failed_visits_skip_the_dwell() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let provider = HttpProvider::new(Duration::from_millis(500), Duration::ZERO);
    let mut session = provider.acquire().await.unwrap();
    let target = Target {
        url: server.uri(),
        dwell: Duration::from_secs(30),
    };

    let started = Instant::now();
    let result = visit(session.as_mut(), &target, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(result.outcome, VisitOutcome::Failure(ErrorKind::Timeout));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn interrupt_during_the_typing_pause_reports_interrupted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut session = HttpSession::new(Duration::from_secs(5), Duration::from_secs(10)).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = session.load(&server.uri(), &cancel).await.unwrap();
    assert!(matches!(outcome, LoadOutcome::Interrupted));
}
