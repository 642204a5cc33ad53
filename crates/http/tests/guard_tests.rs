//! Route guard evaluated end to end against a mocked backend

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use folio_core::{ACCESS_TOKEN, CookieOptions, REFRESH_TOKEN, SessionStore, Token};
use folio_http::middleware::{GuardState, route_guard_middleware};
use folio_http::{FolioClient, GuardDecision, RouteGuard};
use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mint(offset_secs: i64) -> String {
    let exp = i64::try_from(get_current_timestamp()).unwrap() + offset_secs;
    encode(
        &Header::default(),
        &json!({"id": "u-1", "email": "admin@example.com", "exp": exp}),
        &EncodingKey::from_secret(b"backend-secret"),
    )
    .unwrap()
}

async fn mount_refresh(server: &MockServer, access: &str, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": access})))
        .expect(calls)
        .mount(server)
        .await;
}

fn client(server: &MockServer, session: SessionStore) -> FolioClient {
    FolioClient::builder()
        .base_url(server.uri())
        .session(session)
        .build()
        .unwrap()
}

fn app(server: &MockServer) -> Router {
    let template = FolioClient::builder()
        .base_url(server.uri())
        .cookie_options(CookieOptions::protected(false))
        .build()
        .unwrap();
    let state = GuardState::new(RouteGuard::default(), template);
    Router::new()
        .route("/", get(|| async { "home" }))
        .route("/project", get(|| async { "projects" }))
        .route("/login", get(|| async { "login" }))
        .route("/assets/app.js", get(|| async { "js" }))
        .layer(axum::middleware::from_fn_with_state(
            state,
            route_guard_middleware,
        ))
}

fn page(uri: &str, cookie: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_evaluate_with_valid_credential_skips_backend() {
    let mock_server = MockServer::start().await;
    mount_refresh(&mock_server, "unused", 0).await;

    let session = SessionStore::new();
    session.set(ACCESS_TOKEN, Token::new(mint(3600)), CookieOptions::default());
    let client = client(&mock_server, session);
    let guard = RouteGuard::default();

    assert_eq!(guard.evaluate(&client, "/blog").await, GuardDecision::Allow);
    assert_eq!(
        guard.evaluate(&client, "/login").await,
        GuardDecision::RedirectToHome
    );
}

#[tokio::test]
async fn test_evaluate_refreshes_expired_credential_once() {
    let mock_server = MockServer::start().await;
    let fresh = mint(3600);
    mount_refresh(&mock_server, &fresh, 1).await;

    let session = SessionStore::new();
    session.set(ACCESS_TOKEN, Token::new(mint(-60)), CookieOptions::default());
    session.set(REFRESH_TOKEN, Token::from("refresh-1"), CookieOptions::default());
    let client = client(&mock_server, session.clone());

    let decision = RouteGuard::default().evaluate(&client, "/skill").await;

    assert_eq!(decision, GuardDecision::Allow);
    assert_eq!(session.get(ACCESS_TOKEN), Some(Token::new(fresh)));
}

#[tokio::test]
async fn test_evaluate_anonymous_without_refresh_credential() {
    let mock_server = MockServer::start().await;
    mount_refresh(&mock_server, "unused", 0).await;

    let client = client(&mock_server, SessionStore::new());
    let guard = RouteGuard::default();

    assert_eq!(
        guard.evaluate(&client, "/project").await,
        GuardDecision::RedirectToLogin("/login?redirect=/project".to_string())
    );
    assert_eq!(guard.evaluate(&client, "/signup").await, GuardDecision::Allow);
}

#[tokio::test]
async fn test_evaluate_malformed_credential_is_anonymous() {
    let mock_server = MockServer::start().await;
    mount_refresh(&mock_server, "unused", 0).await;

    let session = SessionStore::new();
    session.set(ACCESS_TOKEN, Token::from("not-a-jwt"), CookieOptions::default());
    session.set(REFRESH_TOKEN, Token::from("refresh-1"), CookieOptions::default());
    let client = client(&mock_server, session);

    assert!(matches!(
        RouteGuard::default().evaluate(&client, "/").await,
        GuardDecision::RedirectToLogin(_)
    ));
}

#[tokio::test]
async fn test_middleware_redirects_anonymous_page_request() {
    let mock_server = MockServer::start().await;
    mount_refresh(&mock_server, "unused", 0).await;

    let response = app(&mock_server)
        .oneshot(page("/project", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?redirect=/project"
    );
}

#[tokio::test]
async fn test_middleware_lets_public_assets_through() {
    let mock_server = MockServer::start().await;
    mount_refresh(&mock_server, "unused", 0).await;

    let response = app(&mock_server)
        .oneshot(page("/assets/app.js", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_middleware_sends_logged_in_user_home() {
    let mock_server = MockServer::start().await;
    mount_refresh(&mock_server, "unused", 0).await;

    let cookie = format!("{ACCESS_TOKEN}={}", mint(3600));
    let response = app(&mock_server)
        .oneshot(page("/login", Some(cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_middleware_writes_refreshed_credential_cookie() {
    let mock_server = MockServer::start().await;
    let fresh = mint(3600);
    mount_refresh(&mock_server, &fresh, 1).await;

    let cookie = format!("{REFRESH_TOKEN}=refresh-1");
    let response = app(&mock_server)
        .oneshot(page("/", Some(cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with(&format!("{ACCESS_TOKEN}={fresh}")));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_middleware_clears_rejected_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "revoked"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let cookie = format!(
        "{ACCESS_TOKEN}={}; {REFRESH_TOKEN}=revoked; theme=dark",
        mint(-60)
    );
    let response = app(&mock_server)
        .oneshot(page("/project", Some(cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let set_cookies: Vec<&str> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap())
        .collect();
    assert_eq!(set_cookies.len(), 2);
    for name in [ACCESS_TOKEN, REFRESH_TOKEN] {
        let removal = set_cookies
            .iter()
            .find(|cookie| cookie.starts_with(&format!("{name}=;")))
            .unwrap();
        assert!(removal.contains("Max-Age=0"));
    }
}

#[tokio::test]
async fn test_middleware_keeps_session_during_outage() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&mock_server)
        .await;

    let cookie = format!("{ACCESS_TOKEN}={}; {REFRESH_TOKEN}=refresh-1", mint(-60));
    let response = app(&mock_server)
        .oneshot(page("/project", Some(cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}
