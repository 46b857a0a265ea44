use std::time::Duration;

use session_logout::page::Browser;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use std::sync::Arc;

use session_logout::page::RecordingBrowser;

use crate::helpers::{logout_handler, FailingStore, TestApp, CONTROL_HREF, START_PAGE};

#[tokio::test]
async fn successful_logout_clears_tokens_and_redirects_to_login() {
    let app = TestApp::spawn("a=1; csrftoken=XYZ; b=2").await;

    Mock::given(method("POST"))
        .and(path("/accounts/logout/"))
        .and(header("X-CSRFToken", "XYZ"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.server)
        .await;

    app.click_logout_and_wait().await;

    assert!(!app.has_token("access_token"));
    assert!(!app.has_token("refresh_token"));
    assert!(app.has_token("theme"));
    assert_eq!(app.browser.location(), "/accounts/login/");
    assert_eq!(app.browser.navigations(), vec!["/accounts/login/"]);
    assert!(app.browser.alerts().is_empty());
}

#[tokio::test]
async fn timeout_alerts_the_user_and_changes_nothing() {
    let app = TestApp::spawn("csrftoken=XYZ").await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(180)))
        .expect(1)
        .mount(&app.server)
        .await;

    app.click_logout_and_wait().await;

    let alerts = app.browser.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0], "An error occurred during logout: timeout");
    assert!(app.has_token("access_token"));
    assert!(app.has_token("refresh_token"));
    assert_eq!(app.browser.location(), START_PAGE);
}

#[tokio::test]
async fn rejected_logout_alerts_with_the_generic_error() {
    let app = TestApp::spawn("").await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&app.server)
        .await;

    app.click_logout_and_wait().await;

    assert_eq!(
        app.browser.alerts(),
        vec!["An error occurred during logout: error"]
    );
    assert!(app.has_token("access_token"));
    assert_eq!(app.browser.location(), START_PAGE);
}

#[tokio::test]
async fn missing_csrf_cookie_still_sends_the_request() {
    let app = TestApp::spawn("a=1; b=2").await;

    Mock::given(method("POST"))
        .and(path("/accounts/logout/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.server)
        .await;

    app.click_logout_and_wait().await;

    let requests = app.server.received_requests().await.unwrap();
    let token = requests[0].headers.get("X-CSRFToken").unwrap();
    assert_eq!(token.to_str().unwrap(), "");
    assert_eq!(app.browser.location(), "/accounts/login/");
}

#[tokio::test]
async fn look_alike_cookie_is_not_sent_as_the_token() {
    let app = TestApp::spawn("csrftokenFAKE=BAD; csrftoken=GOOD").await;

    Mock::given(header("X-CSRFToken", "GOOD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.server)
        .await;

    app.click_logout_and_wait().await;

    assert_eq!(app.browser.location(), "/accounts/login/");
}

#[tokio::test]
async fn clicking_never_triggers_the_native_action() {
    let app = TestApp::spawn("csrftoken=XYZ").await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.server)
        .await;

    app.click_logout_and_wait().await;

    assert!(!app.browser.navigations().contains(&CONTROL_HREF.to_string()));
    assert_eq!(app.browser.location(), START_PAGE);
}

#[tokio::test]
async fn two_quick_clicks_send_two_independent_requests() {
    let app = TestApp::spawn("csrftoken=XYZ").await;

    Mock::given(method("POST"))
        .and(path("/accounts/logout/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.server)
        .await;

    let first = app.click_logout();
    let second = app.click_logout();
    assert_eq!(first.started(), 1);
    assert_eq!(second.started(), 1);
    first.settled().await.unwrap();
    second.settled().await.unwrap();

    assert_eq!(
        app.browser.navigations(),
        vec!["/accounts/login/", "/accounts/login/"]
    );
    assert!(!app.has_token("access_token"));
}

#[tokio::test]
async fn page_without_the_control_never_logs_out() {
    let mut app = TestApp::spawn_unbound("csrftoken=XYZ", false).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.server)
        .await;

    assert!(!session_logout::logout::init(&mut app.page, &app.handler));
    let activation = app.click_logout();

    assert_eq!(activation.started(), 0);
    activation.settled().await.unwrap();
    assert!(app.has_token("access_token"));
    assert_eq!(app.browser.location(), START_PAGE);
}

#[tokio::test]
async fn unbound_control_keeps_its_native_action() {
    let app = TestApp::spawn_unbound("csrftoken=XYZ", true).await;

    let activation = app.click_logout();

    assert!(!activation.default_prevented());
    assert_eq!(app.browser.location(), CONTROL_HREF);
}

#[tokio::test]
async fn direct_logout_reports_the_outcome() {
    let app = TestApp::spawn_unbound("csrftoken=XYZ", false).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&app.server)
        .await;

    let e = app.handler.logout().await.unwrap_err();

    assert_eq!(e.to_string(), "error");
    assert_eq!(app.browser.alerts().len(), 1);
}

#[tokio::test]
async fn rejected_and_unreachable_servers_show_the_same_alert() {
    let app = TestApp::spawn("csrftoken=XYZ").await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&app.server)
        .await;

    app.click_logout_and_wait().await;

    // Nothing listens on the discard port
    let browser = Arc::new(RecordingBrowser::new(START_PAGE));
    let unreachable = logout_handler(
        "http://127.0.0.1:9",
        "csrftoken=XYZ",
        app.store.clone(),
        browser.clone(),
    );
    let _ = unreachable.logout().await;

    assert_eq!(app.browser.alerts(), browser.alerts());
    assert_eq!(browser.alerts().len(), 1);
}

#[tokio::test]
async fn failed_token_removal_does_not_block_the_redirect() {
    let app = TestApp::spawn_unbound("csrftoken=XYZ", false).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.server)
        .await;

    let store = Arc::new(FailingStore::default());
    let browser = Arc::new(RecordingBrowser::new(START_PAGE));
    let handler = logout_handler(
        &app.server.uri(),
        "csrftoken=XYZ",
        store.clone(),
        browser.clone(),
    );

    handler.logout().await.unwrap();

    assert_eq!(
        *store.removed.lock().unwrap(),
        vec!["access_token", "refresh_token"]
    );
    assert_eq!(browser.location(), "/accounts/login/");
    assert!(browser.alerts().is_empty());
}
