//! 주문 endpoint.
//!
//! 주문 소유자는 토큰의 사용자로 정해지며, 소유자 또는 admin만 조회/수정/삭제할 수 있습니다.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use super::{current_user, MessageResponse};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiErrorResponse, ApiResult, ValidatedJson};
use crate::metrics::record_order_created;
use crate::repository::{
    NewOrder, Order, OrderDetail, OrderRepository, OrderUpdate, ProductRepository, User,
};
use crate::state::AppState;

fn default_quantity() -> i32 {
    1
}

/// 주문 생성 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub product_id: i64,
    /// 기본값 1
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

/// 주문 부분 수정 요청.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderRequest {
    pub product_id: Option<i64>,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: Option<i32>,
}

/// 소유자 또는 admin인지 확인.
fn ensure_owner_or_admin(caller: &User, order: &Order) -> ApiResult<()> {
    if order.user_id == caller.id || caller.role.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("access denied"))
    }
}

async fn ensure_product_exists(pool: &PgPool, product_id: i64) -> ApiResult<()> {
    if ProductRepository::exists(pool, product_id).await? {
        Ok(())
    } else {
        Err(ApiError::not_found("product"))
    }
}

/// 주문을 읽고 접근 권한 확인.
async fn load_owned_order(pool: &PgPool, caller: &User, id: i64) -> ApiResult<Order> {
    let order = OrderRepository::get_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("order"))?;
    ensure_owner_or_admin(caller, &order)?;
    Ok(order)
}

async fn load_detail(pool: &PgPool, id: i64) -> ApiResult<OrderDetail> {
    OrderRepository::get_detail(pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found("order"))
}

/// 주문 목록. admin은 전체, 일반 사용자는 본인 주문.
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "주문 목록", body = Vec<OrderDetail>),
        (status = 503, description = "DB 미설정", body = ApiErrorResponse)
    )
)]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<OrderDetail>>> {
    let pool = state.db()?;
    let caller = current_user(&state, auth).await?;

    let owner = (!caller.role.is_admin()).then_some(caller.id);
    Ok(Json(OrderRepository::list(pool, owner).await?))
}

/// 주문 조회.
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "주문 ID")),
    responses(
        (status = 200, description = "주문", body = OrderDetail),
        (status = 403, description = "접근 불가", body = ApiErrorResponse),
        (status = 404, description = "주문 없음", body = ApiErrorResponse)
    )
)]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<OrderDetail>> {
    let pool = state.db()?;
    let caller = current_user(&state, auth).await?;

    load_owned_order(pool, &caller, id).await?;
    Ok(Json(load_detail(pool, id).await?))
}

/// 주문 생성.
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "생성된 주문", body = OrderDetail),
        (status = 400, description = "검증 실패", body = ApiErrorResponse),
        (status = 404, description = "상품 없음", body = ApiErrorResponse)
    )
)]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderDetail>)> {
    let pool = state.db()?;
    let caller = current_user(&state, auth).await?;
    ensure_product_exists(pool, req.product_id).await?;

    let order = OrderRepository::create(
        pool,
        NewOrder {
            user_id: caller.id,
            product_id: req.product_id,
            quantity: req.quantity,
        },
    )
    .await?;

    record_order_created();
    info!(order_id = order.id, user_id = caller.id, "Order created");

    Ok((StatusCode::CREATED, Json(load_detail(pool, order.id).await?)))
}

/// 주문 부분 수정.
#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "주문 ID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "수정된 주문", body = OrderDetail),
        (status = 403, description = "접근 불가", body = ApiErrorResponse),
        (status = 404, description = "주문 또는 상품 없음", body = ApiErrorResponse)
    )
)]
pub async fn update_order(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UpdateOrderRequest>,
) -> ApiResult<Json<OrderDetail>> {
    let pool = state.db()?;
    let caller = current_user(&state, auth).await?;
    load_owned_order(pool, &caller, id).await?;

    if let Some(product_id) = req.product_id {
        ensure_product_exists(pool, product_id).await?;
    }

    OrderRepository::update(
        pool,
        id,
        OrderUpdate {
            product_id: req.product_id,
            quantity: req.quantity,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("order"))?;

    Ok(Json(load_detail(pool, id).await?))
}

/// 주문 삭제.
#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "주문 ID")),
    responses(
        (status = 200, description = "삭제 완료", body = MessageResponse),
        (status = 403, description = "접근 불가", body = ApiErrorResponse),
        (status = 404, description = "주문 없음", body = ApiErrorResponse)
    )
)]
pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let pool = state.db()?;
    let caller = current_user(&state, auth).await?;
    load_owned_order(pool, &caller, id).await?;

    if !OrderRepository::delete(pool, id).await? {
        return Err(ApiError::not_found("order"));
    }

    Ok(Json(MessageResponse::new("Order deleted")))
}

/// 주문 라우터 (인증 필요).
pub fn orders_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::require_auth;
    use crate::state::create_test_state;
    use axum::{body::Body, http::Request, middleware};
    use chrono::Utc;
    use shop_core::Role;
    use tower::ServiceExt;

    fn user(id: i64, role: Role) -> User {
        let now = Utc::now();
        User {
            id,
            name: "Test".to_string(),
            email: format!("user{}@x.com", id),
            password_hash: String::new(),
            role,
            created_at: now,
            updated_at: now,
        }
    }

    fn order(user_id: i64) -> Order {
        let now = Utc::now();
        Order {
            id: 1,
            user_id,
            product_id: 1,
            quantity: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_owner_or_admin() {
        assert!(ensure_owner_or_admin(&user(1, Role::User), &order(1)).is_ok());
        assert!(ensure_owner_or_admin(&user(2, Role::Admin), &order(1)).is_ok());
        assert!(matches!(
            ensure_owner_or_admin(&user(2, Role::User), &order(1)),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_create_request_default_quantity() {
        let req: CreateOrderRequest = serde_json::from_str(r#"{"product_id": 3}"#).unwrap();
        assert_eq!(req.quantity, 1);
        assert!(req.validate().is_ok());

        let zero: CreateOrderRequest =
            serde_json::from_str(r#"{"product_id": 3, "quantity": 0}"#).unwrap();
        assert!(zero.validate().is_err());
    }

    #[tokio::test]
    async fn test_orders_without_database() {
        let state = Arc::new(create_test_state());
        let token = state.tokens.issue(1, Role::User).unwrap();
        let app = orders_router()
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .with_state(state);

        let request = Request::builder()
            .uri("/orders")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
