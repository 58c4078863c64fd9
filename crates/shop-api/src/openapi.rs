//! OpenAPI 문서화 설정.
//!
//! utoipa로 REST API의 OpenAPI 3 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiErrorResponse;
use crate::repository::{OrderDetail, Product, UserResponse, UserSummary};
use crate::routes::{
    AuthResponse, ComponentHealth, ComponentState, ComponentStatus, CreateOrderRequest,
    CreateProductRequest, HealthResponse, LoginRequest, MessageResponse, RegisterRequest,
    ServiceStatus, UpdateOrderRequest, UpdateProductRequest, UpdateUserRequest,
};

/// Bearer 토큰 보안 스키마 등록.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Storefront API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        description = r#"
# Storefront REST API

사용자, 상품, 주문 관리를 위한 REST API입니다.

## 인증

`POST /api/register` 또는 `POST /api/login`으로 받은 토큰을
`Authorization: Bearer <token>` 헤더에 포함하세요. 토큰 유효 시간은 24시간입니다.

상품 생성/수정/삭제와 사용자 목록은 admin 역할이 필요합니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크"),
        (name = "auth", description = "가입/로그인/현재 사용자"),
        (name = "users", description = "사용자 관리"),
        (name = "products", description = "상품 조회 및 관리"),
        (name = "orders", description = "주문 관리")
    ),
    modifiers(&BearerAuth),
    components(
        schemas(
            // ===== Common =====
            ApiErrorResponse,
            MessageResponse,

            // ===== Health =====
            HealthResponse,
            ServiceStatus,
            ComponentHealth,
            ComponentStatus,
            ComponentState,

            // ===== Auth / Users =====
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            UserResponse,
            UserSummary,
            UpdateUserRequest,

            // ===== Products =====
            Product,
            CreateProductRequest,
            UpdateProductRequest,

            // ===== Orders =====
            OrderDetail,
            CreateOrderRequest,
            UpdateOrderRequest,
        )
    ),
    paths(
        // ===== Health =====
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        // ===== Auth =====
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::me,

        // ===== Users =====
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        crate::routes::users::update_user,
        crate::routes::users::delete_user,

        // ===== Products =====
        crate::routes::products::list_products,
        crate::routes::products::get_product,
        crate::routes::products::create_product,
        crate::routes::products::update_product,
        crate::routes::products::delete_product,

        // ===== Orders =====
        crate::routes::orders::list_orders,
        crate::routes::orders::get_order,
        crate::routes::orders::create_order,
        crate::routes::orders::update_order,
        crate::routes::orders::delete_order,
    )
)]
pub struct ApiDoc;

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
