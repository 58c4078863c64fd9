//! 가입 → 로그인 → 보호 라우트 → admin 라우트 흐름 통합 테스트.
//!
//! 데이터베이스 없이 메모리 사용자 저장소로 전체 라우터를 구동합니다.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use shop_api::repository::UserUpdate;
use shop_api::{create_api_router, AppState, TokenService};
use shop_core::Role;
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret-key-minimum-32-chars";

fn test_state() -> Arc<AppState> {
    Arc::new(AppState::in_memory(TokenService::new(SECRET).unwrap()))
}

fn app(state: &Arc<AppState>) -> Router {
    create_api_router(state.clone()).with_state(state.clone())
}

async fn request(
    state: &Arc<AppState>,
    method: &str,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

#[tokio::test]
async fn register_and_login_tokens_resolve_to_same_user() {
    let state = test_state();

    let (status, registered) = request(
        &state,
        "POST",
        "/api/register",
        None,
        Some(json!({"name": "Alice", "email": "alice@x.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let t1 = registered["token"].as_str().unwrap().to_string();

    let (status, logged_in) = request(
        &state,
        "POST",
        "/api/login",
        None,
        Some(json!({"email": "alice@x.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let t2 = logged_in["token"].as_str().unwrap().to_string();

    let (status, me1) = request(&state, "GET", "/api/me", Some(&bearer(&t1)), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, me2) = request(&state, "GET", "/api/me", Some(&bearer(&t2)), None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(me1["id"], me2["id"]);
    assert_eq!(me1["id"], registered["user"]["id"]);
    assert_eq!(me1["email"], "alice@x.com");
}

#[tokio::test]
async fn gate_rejections() {
    let state = test_state();

    let (status, body) = request(&state, "GET", "/api/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "authorization required");

    let (status, body) = request(&state, "GET", "/api/me", Some("Basic xyz"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid authorization header");

    let (status, body) = request(&state, "GET", "/api/me", Some("Bearer not.a.jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid token");
}

#[tokio::test]
async fn admin_route_follows_stored_role() {
    let state = test_state();

    let (_, registered) = request(
        &state,
        "POST",
        "/api/register",
        None,
        Some(json!({"name": "Bob", "email": "bob@x.com", "password": "secret1"})),
    )
    .await;
    let token = registered["token"].as_str().unwrap().to_string();
    let user_id = registered["user"]["id"].as_i64().unwrap();

    let (status, body) = request(&state, "GET", "/api/users", Some(&bearer(&token)), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "admin access required");

    // 저장소에서 승격하면 기존 토큰으로 바로 통과
    state
        .users
        .update_user(
            user_id,
            UserUpdate {
                role: Some(Role::Admin),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let (status, body) = request(&state, "GET", "/api/users", Some(&bearer(&token)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // admin 게이트를 통과한 뒤 DB가 없으므로 503
    let (status, body) = request(
        &state,
        "POST",
        "/api/products",
        Some(&bearer(&token)),
        Some(json!({"title": "iPhone 15 Pro", "price": 999})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "DATABASE_UNAVAILABLE");
}

#[tokio::test]
async fn products_without_database_are_unavailable() {
    let state = test_state();

    let (status, body) = request(&state, "GET", "/api/products?category=Laptops", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "DATABASE_UNAVAILABLE");
}
