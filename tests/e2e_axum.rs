//! End-to-end tests for the axum session extractor.
//!
//! Run with: `cargo test --features axum --test e2e_axum`

#![cfg(feature = "axum")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use http_body_util::BodyExt;
use telehealth_session::api::axum::{CurrentSession, SessionRejection};
use telehealth_session::{MemoryStore, SessionConfig, SessionManager};
use tower::ServiceExt;

type Manager = Arc<SessionManager<MemoryStore>>;

async fn launch(State(manager): State<Manager>) -> Result<impl IntoResponse, SessionRejection> {
    let new = manager.new_session().await?;

    let mut session = new.session.clone();
    session.data.launch_id = Some("launch-1".to_owned());
    manager.save(&session).await?;

    let mut headers = HeaderMap::new();
    new.append_to(&mut headers)?;
    Ok((StatusCode::CREATED, headers))
}

async fn me(session: CurrentSession<MemoryStore>) -> String {
    session
        .session()
        .data
        .launch_id
        .clone()
        .unwrap_or_default()
}

fn create_app() -> Router {
    let manager = SessionManager::new(MemoryStore::new(), SessionConfig::default()).unwrap();

    Router::new()
        .route("/launch", post(launch))
        .route("/me", get(me))
        .with_state(Arc::new(manager))
}

async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_launch_then_me() {
    let app = create_app();

    let response = app
        .clone()
        .oneshot(Request::post("/launch").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    let cookie = set_cookie.split(';').next().unwrap().to_owned();

    let response = app
        .oneshot(
            Request::get("/me")
                .header(COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_string(response.into_body()).await, "launch-1");
}

#[tokio::test]
async fn test_me_without_cookie() {
    let response = create_app()
        .oneshot(Request::get("/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value =
        serde_json::from_str(&body_to_string(response.into_body()).await).unwrap();
    assert_eq!(body["code"], "NO_SESSION_COOKIE");
}

#[tokio::test]
async fn test_me_with_unknown_session() {
    let response = create_app()
        .oneshot(
            Request::get("/me")
                .header(COOKIE, "session=unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
