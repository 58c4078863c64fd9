//! Axum용 인증/권한 미들웨어.
//!
//! - [`require_auth`]: Bearer 토큰을 검증하고 [`AuthUser`]를 요청 extension에 바인딩
//! - [`require_admin`]: 바인딩된 사용자의 역할을 저장소에서 다시 읽어 admin 여부 확인
//!
//! 역할 게이트는 인증 게이트 뒤에 합성해야 합니다.
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/products", post(create_product))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
//!     .route_layer(middleware::from_fn_with_state(state, require_auth));
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use shop_core::{Identity, Role};
use tracing::{debug, error};

use super::jwt::{AuthErrorKind, TokenService};
use super::store::{StoreError, UserStore};
use crate::error::ApiErrorResponse;
use crate::metrics::record_auth_rejection;
use crate::repository::users::User;
use crate::state::AppState;

/// 인증 게이트가 바인딩하는 요청 주체.
///
/// 핸들러에서 추출기로 사용합니다. 바인딩이 없으면 401 "authentication required".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

/// 인증/권한 거부.
#[derive(Debug, thiserror::Error)]
pub enum AuthRejection {
    #[error("authorization required")]
    MissingAuthorization,

    #[error("invalid authorization header")]
    InvalidAuthorizationHeader,

    /// 세부 유형은 로그/메트릭 전용. 응답은 항상 같음
    #[error("invalid token")]
    InvalidToken(AuthErrorKind),

    #[error("authentication required")]
    AuthenticationRequired,

    #[error("user not found")]
    UserNotFound,

    #[error("{0} access required")]
    InsufficientRole(Role),

    #[error("user store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthRejection {
    /// 메트릭 라벨.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingAuthorization => "missing_header",
            Self::InvalidAuthorizationHeader => "invalid_header",
            Self::InvalidToken(kind) => kind.as_str(),
            Self::AuthenticationRequired => "unauthenticated",
            Self::UserNotFound => "user_not_found",
            Self::InsufficientRole(_) => "insufficient_role",
            Self::Store(_) => "store_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingAuthorization
            | Self::InvalidAuthorizationHeader
            | Self::InvalidToken(_)
            | Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InsufficientRole(_) => StatusCode::FORBIDDEN,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MissingAuthorization => "MISSING_TOKEN",
            Self::InvalidAuthorizationHeader => "INVALID_AUTH_HEADER",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::AuthenticationRequired => "UNAUTHORIZED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InsufficientRole(_) => "FORBIDDEN",
            Self::Store(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Store(e) => {
                error!(error = %e, "User lookup failed during authorization");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (self.status(), Json(ApiErrorResponse::new(self.code(), message))).into_response()
    }
}

/// 거부 사유를 로그와 메트릭에 남기고 그대로 반환.
fn reject(rejection: AuthRejection) -> AuthRejection {
    debug!(reason = rejection.reason(), "Request rejected");
    record_auth_rejection(rejection.reason());
    rejection
}

/// `Authorization` 헤더에서 Bearer 토큰 추출.
///
/// 첫 공백 문자에서 scheme과 credential로 나눕니다. scheme은 대소문자를
/// 구분하지 않고 `Bearer`여야 하며, 나머지는 가공 없이 credential로 넘겨
/// 토큰 검증에서 판정합니다 (`"Bearer "`, `"Bearer a b"`는 "invalid token").
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthRejection> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthRejection::MissingAuthorization)?;

    // visible ASCII가 아니면 형식 오류
    let value = value
        .to_str()
        .map_err(|_| AuthRejection::InvalidAuthorizationHeader)?;

    let (scheme, token) = value
        .split_once(|c: char| c.is_ascii_whitespace())
        .ok_or(AuthRejection::InvalidAuthorizationHeader)?;

    if scheme.eq_ignore_ascii_case("bearer") {
        Ok(token)
    } else {
        Err(AuthRejection::InvalidAuthorizationHeader)
    }
}

/// 요청 헤더로 인증 주체 확인.
pub fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> Result<Identity, AuthRejection> {
    let token = extract_bearer(headers).map_err(reject)?;

    tokens
        .verify(token)
        .map_err(|e| reject(AuthRejection::InvalidToken(e.kind())))
}

/// 인증 게이트.
///
/// 검증에 성공하면 [`AuthUser`]를 extension에 넣고 다음 핸들러로 진행합니다.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let identity = authenticate(&state.tokens, request.headers())?;

    request.extensions_mut().insert(AuthUser {
        user_id: identity.user_id,
    });

    Ok(next.run(request).await)
}

/// 바인딩된 사용자가 요구 역할을 가졌는지 확인.
///
/// 토큰에 담긴 역할이 아니라 저장소의 현재 역할을 기준으로 판단합니다.
/// 성공하면 저장소에서 읽은 사용자를 반환합니다.
pub async fn authorize(
    users: &dyn UserStore,
    auth_user: Option<&AuthUser>,
    required: Role,
) -> Result<User, AuthRejection> {
    let auth_user = auth_user.ok_or_else(|| reject(AuthRejection::AuthenticationRequired))?;

    let user = users
        .get_user_by_id(auth_user.user_id)
        .await
        .map_err(|e| reject(e.into()))?
        .ok_or_else(|| reject(AuthRejection::UserNotFound))?;

    if user.role != required {
        return Err(reject(AuthRejection::InsufficientRole(required)));
    }

    Ok(user)
}

/// admin 역할 게이트.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let auth_user = request.extensions().get::<AuthUser>().copied();
    authorize(state.users.as_ref(), auth_user.as_ref(), Role::Admin).await?;

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AuthRejection::AuthenticationRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::Claims;
    use crate::repository::users::{NewUser, UserUpdate};
    use crate::state::create_test_state;
    use axum::{body::Body, http::Request as HttpRequest, middleware, routing::get, Router};
    use chrono::{Duration, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn whoami(auth: AuthUser) -> String {
        auth.user_id.to_string()
    }

    fn app(state: Arc<AppState>) -> Router {
        let protected = Router::new()
            .route("/me", get(whoami))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

        let admin = Router::new()
            .route("/admin", get(whoami))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

        Router::new()
            .merge(protected)
            .merge(admin)
            .route("/ungated", get(whoami))
            .with_state(state)
    }

    async fn add_user(state: &AppState, email: &str, role: Role) -> User {
        state
            .users
            .create_user(NewUser {
                name: "Test".to_string(),
                email: email.to_string(),
                password_hash: "unused".to_string(),
                role,
            })
            .await
            .unwrap()
    }

    async fn call(app: Router, uri: &str, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn message(body: &str) -> String {
        let json: Value = serde_json::from_str(body).unwrap();
        json["message"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            extract_bearer(&headers),
            Err(AuthRejection::MissingAuthorization)
        ));

        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(extract_bearer(&headers).unwrap(), "abc");

        headers.insert(AUTHORIZATION, "bEaReR abc".parse().unwrap());
        assert_eq!(extract_bearer(&headers).unwrap(), "abc");

        // 첫 공백 이후는 그대로 credential
        for (header, token) in [("Bearer a b", "a b"), ("Bearer  tok", " tok"), ("Bearer\tx", "x")] {
            headers.insert(AUTHORIZATION, header.parse().unwrap());
            assert_eq!(extract_bearer(&headers).unwrap(), token, "header: {:?}", header);
        }

        for bad in ["Basic xyz", "Bearer", "BearerX abc", "abc", ""] {
            headers.insert(AUTHORIZATION, bad.parse().unwrap());
            assert!(
                matches!(
                    extract_bearer(&headers),
                    Err(AuthRejection::InvalidAuthorizationHeader)
                ),
                "header: {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_non_ascii_header_is_invalid() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            axum::http::HeaderValue::from_bytes("Bearer 토큰".as_bytes()).unwrap(),
        );
        assert!(matches!(
            extract_bearer(&headers),
            Err(AuthRejection::InvalidAuthorizationHeader)
        ));
    }

    #[tokio::test]
    async fn test_missing_header() {
        let state = Arc::new(create_test_state());
        let (status, body) = call(app(state), "/me", None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "authorization required");
    }

    #[tokio::test]
    async fn test_wrong_scheme() {
        let state = Arc::new(create_test_state());
        let (status, body) = call(app(state), "/me", Some("Basic xyz")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "invalid authorization header");
    }

    #[tokio::test]
    async fn test_token_failures_share_one_response() {
        let state = Arc::new(create_test_state());

        let expired = state
            .tokens
            .sign(&Claims::issued_at(
                1,
                Role::User,
                Utc::now() - Duration::hours(48),
                Duration::hours(24),
            ))
            .unwrap();
        let foreign = TokenService::new("another-secret-another-secret-1234")
            .unwrap()
            .issue(1, Role::User)
            .unwrap();

        let mut bodies = Vec::new();
        for token in ["garbage", expired.as_str(), foreign.as_str(), "", "a b", " garbage"] {
            let (status, body) =
                call(app(state.clone()), "/me", Some(&format!("Bearer {}", token))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(message(&body), "invalid token");
            bodies.push(body);
        }
        assert!(bodies.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_valid_token_binds_user_id() {
        let state = Arc::new(create_test_state());
        let token = state.tokens.issue(42, Role::User).unwrap();

        let (status, body) = call(app(state), "/me", Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "42");
    }

    #[tokio::test]
    async fn test_extractor_without_gate() {
        let state = Arc::new(create_test_state());
        let (status, body) = call(app(state), "/ungated", None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "authentication required");
    }

    #[tokio::test]
    async fn test_admin_gate_rejects_user() {
        let state = Arc::new(create_test_state());
        let user = add_user(&state, "user@x.com", Role::User).await;
        let token = state.tokens.issue(user.id, Role::User).unwrap();

        let (status, body) =
            call(app(state), "/admin", Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(message(&body), "admin access required");
    }

    #[tokio::test]
    async fn test_admin_gate_reads_role_from_store() {
        let state = Arc::new(create_test_state());
        let user = add_user(&state, "user@x.com", Role::User).await;

        // 토큰에는 admin이 있어도 저장소 역할이 user면 거부
        let token = state.tokens.issue(user.id, Role::Admin).unwrap();
        let header = format!("Bearer {}", token);
        let (status, _) = call(app(state.clone()), "/admin", Some(&header)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // 저장소에서 승격하면 같은 토큰으로 통과
        state
            .users
            .update_user(
                user.id,
                UserUpdate {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let (status, body) = call(app(state), "/admin", Some(&header)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, user.id.to_string());
    }

    #[tokio::test]
    async fn test_admin_gate_unknown_user() {
        let state = Arc::new(create_test_state());
        let token = state.tokens.issue(999, Role::Admin).unwrap();

        let (status, body) =
            call(app(state), "/admin", Some(&format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message(&body), "user not found");
    }

    #[tokio::test]
    async fn test_authorize_without_binding() {
        let state = create_test_state();
        let err = authorize(state.users.as_ref(), None, Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthRejection::AuthenticationRequired));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_authorize_returns_stored_user() {
        let state = create_test_state();
        let admin = add_user(&state, "admin@x.com", Role::Admin).await;

        let user = authorize(
            state.users.as_ref(),
            Some(&AuthUser { user_id: admin.id }),
            Role::Admin,
        )
        .await
        .unwrap();
        assert_eq!(user.email, "admin@x.com");
    }
}
