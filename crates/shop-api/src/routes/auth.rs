//! 회원가입/로그인 endpoint.
//!
//! - `POST /api/register` - 가입 후 토큰 발급 (201)
//! - `POST /api/login` - 자격 증명 확인 후 토큰 발급 (200)
//! - `GET /api/me` - 현재 사용자 조회 (인증 필요)

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use shop_core::Role;
use tracing::{info, warn};
use utoipa::ToSchema;
use validator::Validate;

use super::current_user;
use crate::auth::{hash_password, verify_password, verify_unknown_user, AuthUser};
use crate::error::{ApiError, ApiErrorResponse, ApiResult, ValidatedJson};
use crate::metrics::record_login;
use crate::repository::{NewUser, UserResponse};
use crate::state::AppState;

/// 회원가입 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
}

/// 로그인 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// 토큰과 사용자 정보.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Argon2 해싱을 blocking 풀에서 실행.
pub(crate) async fn hash_blocking(password: String) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// Argon2 검증을 blocking 풀에서 실행.
///
/// 해시가 없으면(미가입 이메일) 같은 비용을 치르고 `false`.
async fn verify_blocking(password: String, hash: Option<String>) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => verify_unknown_user(&password),
    })
    .await
    .map_err(|e| ApiError::internal(e.to_string()))
}

fn issue_token(state: &AppState, user_id: i64, role: Role) -> ApiResult<String> {
    state
        .tokens
        .issue(user_id, role)
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// 회원가입.
///
/// 새 사용자는 항상 `user` 역할로 생성됩니다.
#[utoipa::path(
    post,
    path = "/api/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "가입 성공", body = AuthResponse),
        (status = 400, description = "검증 실패 또는 이메일 중복", body = ApiErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let password_hash = hash_blocking(req.password).await?;

    let user = state
        .users
        .create_user(NewUser {
            name: req.name.trim().to_string(),
            email: req.email,
            password_hash,
            role: Role::User,
        })
        .await?;

    let token = issue_token(&state, user.id, user.role)?;
    info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// 로그인.
///
/// 이메일 미존재와 비밀번호 불일치는 같은 응답을 반환합니다.
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공", body = AuthResponse),
        (status = 401, description = "자격 증명 불일치", body = ApiErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = state.users.find_by_email(&req.email).await?;
    let hash = user.as_ref().map(|u| u.password_hash.clone());
    let verified = verify_blocking(req.password, hash).await?;

    let user = match user {
        Some(user) if verified => user,
        other => {
            if let Some(user) = other {
                warn!(user_id = user.id, "Login failed");
            }
            record_login("failure");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let token = issue_token(&state, user.id, user.role)?;
    record_login("success");

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// 현재 사용자 조회.
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "현재 사용자", body = UserResponse),
        (status = 401, description = "인증 실패", body = ApiErrorResponse),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse)
    )
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<UserResponse>> {
    let user = current_user(&state, auth).await?;
    Ok(Json(user.into()))
}

/// 공개 인증 라우터 (`/register`, `/login`).
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// 인증 필요 라우터 (`/me`).
pub fn me_router() -> Router<Arc<AppState>> {
    Router::new().route("/me", get(me))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::require_auth;
    use crate::state::create_test_state;
    use axum::{body::Body, http::Request, middleware};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(state: Arc<AppState>) -> Router {
        let protected = me_router()
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

        Router::new()
            .merge(auth_router())
            .merge(protected)
            .with_state(state)
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_register_returns_token_and_user() {
        let state = Arc::new(create_test_state());
        let (status, body) = post_json(
            app(state.clone()),
            "/register",
            json!({"name": "Alice", "email": "alice@x.com", "password": "secret1"}),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "alice@x.com");
        assert_eq!(body["user"]["role"], "user");
        assert!(body["user"].get("password_hash").is_none());

        let token = body["token"].as_str().unwrap();
        let identity = state.tokens.verify(token).unwrap();
        assert_eq!(identity.user_id, body["user"]["id"].as_i64().unwrap());
        assert_eq!(identity.role, Role::User);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let state = Arc::new(create_test_state());
        let payload = json!({"name": "Alice", "email": "alice@x.com", "password": "secret1"});

        let (status, _) = post_json(app(state.clone()), "/register", payload.clone()).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = post_json(app(state), "/register", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "email already in use");
    }

    #[tokio::test]
    async fn test_register_validation() {
        let state = Arc::new(create_test_state());

        for payload in [
            json!({"name": "Alice", "email": "not-an-email", "password": "secret1"}),
            json!({"name": "Alice", "email": "alice@x.com", "password": "12345"}),
            json!({"name": "", "email": "alice@x.com", "password": "secret1"}),
            json!({"email": "alice@x.com", "password": "secret1"}),
        ] {
            let (status, body) = post_json(app(state.clone()), "/register", payload).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_login_success_and_failure() {
        let state = Arc::new(create_test_state());
        post_json(
            app(state.clone()),
            "/register",
            json!({"name": "Alice", "email": "alice@x.com", "password": "secret1"}),
        )
        .await;

        let (status, body) = post_json(
            app(state.clone()),
            "/login",
            json!({"email": "Alice@X.com", "password": "secret1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.tokens.verify(body["token"].as_str().unwrap()).is_ok());

        let (wrong_pw_status, wrong_pw) = post_json(
            app(state.clone()),
            "/login",
            json!({"email": "alice@x.com", "password": "secret2"}),
        )
        .await;
        let (unknown_status, unknown) = post_json(
            app(state),
            "/login",
            json!({"email": "bob@x.com", "password": "secret1"}),
        )
        .await;

        assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_pw, unknown);
        assert_eq!(wrong_pw["message"], "invalid credentials");
    }

    #[tokio::test]
    async fn test_unknown_email_still_runs_verification() {
        let hash = hash_password("secret1").unwrap();
        assert!(verify_blocking("secret1".to_string(), Some(hash.clone())).await.unwrap());
        assert!(!verify_blocking("secret2".to_string(), Some(hash)).await.unwrap());
        assert!(!verify_blocking("secret1".to_string(), None).await.unwrap());
    }

    #[tokio::test]
    async fn test_me_for_deleted_user() {
        let state = Arc::new(create_test_state());
        let token = state.tokens.issue(77, Role::User).unwrap();

        let request = Request::builder()
            .uri("/me")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = app(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
