//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/` - 서버 동작 확인
//! - `/health`, `/health/ready` - 헬스 체크
//! - `/api/register`, `/api/login` - 공개 인증
//! - `/api/products` - 상품 조회 (공개), 생성/수정/삭제 (admin)
//! - `/api/me`, `/api/users/{id}`, `/api/orders` - 인증 필요
//! - `/api/users` - 사용자 목록 (admin)

pub mod auth;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;

pub use auth::{auth_router, me_router, AuthResponse, LoginRequest, RegisterRequest};
pub use health::{
    health_router, ComponentHealth, ComponentState, ComponentStatus, HealthResponse, ServiceStatus,
};
pub use orders::{orders_router, CreateOrderRequest, UpdateOrderRequest};
pub use products::{
    products_admin_router, products_router, CreateProductRequest, UpdateProductRequest,
};
pub use users::{users_admin_router, users_router, UpdateUserRequest};

use std::sync::Arc;

use axum::{middleware, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{require_admin, require_auth, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::repository::User;
use crate::state::AppState;

/// 단순 메시지 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 인증된 요청 주체의 현재 사용자 레코드.
pub(crate) async fn current_user(state: &AppState, auth: AuthUser) -> ApiResult<User> {
    state
        .users
        .get_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))
}

/// GET /
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("API Running"))
}

/// 전체 API 라우터 생성.
///
/// 게이트는 `route_layer`로 그룹마다 적용됩니다. admin 그룹은 인증 게이트가
/// 먼저 실행되고 역할 게이트가 뒤따릅니다.
pub fn create_api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public = Router::new().merge(auth_router()).merge(products_router());

    let protected = Router::new()
        .merge(me_router())
        .merge(users_router())
        .merge(orders_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .merge(users_admin_router())
        .merge(products_admin_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/", get(root))
        .nest("/health", health_router())
        .nest("/api", public.merge(protected).merge(admin))
}
