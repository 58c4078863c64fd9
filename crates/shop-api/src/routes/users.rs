//! 사용자 관리 endpoint.
//!
//! 본인 또는 admin만 접근할 수 있으며, 역할 변경은 admin만 가능합니다.
//! 목록 조회(`GET /api/users`)는 admin 게이트 뒤에 있습니다.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shop_core::Role;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use super::{current_user, MessageResponse};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiErrorResponse, ApiResult, ValidatedJson};
use crate::repository::{User, UserResponse, UserUpdate};
use crate::routes::auth::hash_blocking;
use crate::state::AppState;

/// 사용자 수정 요청. 생략한 필드는 유지됩니다.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "invalid email"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: Option<String>,
    /// admin만 변경 가능
    pub role: Option<Role>,
}

/// 본인 또는 admin인지 확인.
fn ensure_self_or_admin(caller: &User, target_id: i64) -> ApiResult<()> {
    if caller.id == target_id || caller.role.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("access denied"))
    }
}

/// 전체 사용자 목록 (admin).
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "사용자 목록", body = Vec<UserResponse>),
        (status = 403, description = "admin 아님", body = ApiErrorResponse)
    )
)]
pub async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state.users.list_users().await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// 사용자 조회.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "사용자 ID")),
    responses(
        (status = 200, description = "사용자", body = UserResponse),
        (status = 403, description = "접근 불가", body = ApiErrorResponse),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserResponse>> {
    let caller = current_user(&state, auth).await?;
    ensure_self_or_admin(&caller, id)?;

    let user = state
        .users
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;

    Ok(Json(user.into()))
}

/// 사용자 수정.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "사용자 ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "수정된 사용자", body = UserResponse),
        (status = 400, description = "검증 실패 또는 이메일 중복", body = ApiErrorResponse),
        (status = 403, description = "접근 불가", body = ApiErrorResponse),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let caller = current_user(&state, auth).await?;
    ensure_self_or_admin(&caller, id)?;

    if req.role.is_some() && !caller.role.is_admin() {
        return Err(ApiError::forbidden("only admin can change roles"));
    }

    let password_hash = match req.password {
        Some(password) => Some(hash_blocking(password).await?),
        None => None,
    };

    let update = UserUpdate {
        name: req.name.map(|n| n.trim().to_string()),
        email: req.email,
        password_hash,
        role: req.role,
    };

    let user = state
        .users
        .update_user(id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;

    info!(user_id = id, by = caller.id, "User updated");
    Ok(Json(user.into()))
}

/// 사용자 삭제.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "사용자 ID")),
    responses(
        (status = 200, description = "삭제 완료", body = MessageResponse),
        (status = 403, description = "접근 불가", body = ApiErrorResponse),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let caller = current_user(&state, auth).await?;
    ensure_self_or_admin(&caller, id)?;

    if !state.users.delete_user(id).await? {
        return Err(ApiError::not_found("user"));
    }

    info!(user_id = id, by = caller.id, "User deleted");
    Ok(Json(MessageResponse::new("User deleted")))
}

/// 인증 필요 사용자 라우터.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new().route("/users/{id}", get(get_user).put(update_user).delete(delete_user))
}

/// admin 전용 사용자 라우터.
pub fn users_admin_router() -> Router<Arc<AppState>> {
    Router::new().route("/users", get(list_users))
}
