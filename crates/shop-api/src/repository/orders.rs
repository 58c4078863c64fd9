//! 주문 저장소.
//!
//! 주문 CRUD와 사용자/상품 정보를 포함한 상세 조회를 처리합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;

use super::products::Product;
use super::users::UserSummary;

/// 주문 레코드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 사용자 요약과 상품을 포함한 주문 응답.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct OrderDetail {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: UserSummary,
    pub product: Product,
}

/// 새 주문 생성 입력.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

/// 주문 부분 수정 입력.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub product_id: Option<i64>,
    pub quantity: Option<i32>,
}

/// 조인 조회 결과 행.
#[derive(Debug, FromRow)]
struct OrderDetailRow {
    id: i64,
    user_id: i64,
    product_id: i64,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_name: String,
    user_email: String,
    product_title: String,
    product_price: Decimal,
    product_description: String,
    product_category: String,
    product_image: Option<String>,
    product_created_at: DateTime<Utc>,
    product_updated_at: DateTime<Utc>,
}

impl From<OrderDetailRow> for OrderDetail {
    fn from(row: OrderDetailRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user: UserSummary {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
            },
            product: Product {
                id: row.product_id,
                title: row.product_title,
                price: row.product_price,
                description: row.product_description,
                category: row.product_category,
                image: row.product_image,
                created_at: row.product_created_at,
                updated_at: row.product_updated_at,
            },
        }
    }
}

const DETAIL_SELECT: &str = r#"
    SELECT o.id, o.user_id, o.product_id, o.quantity, o.created_at, o.updated_at,
           u.name AS user_name, u.email AS user_email,
           p.title AS product_title, p.price AS product_price,
           p.description AS product_description, p.category AS product_category,
           p.image AS product_image,
           p.created_at AS product_created_at, p.updated_at AS product_updated_at
    FROM orders o
    JOIN users u ON u.id = o.user_id
    JOIN products p ON p.id = o.product_id
"#;

const ORDER_COLUMNS: &str = "id, user_id, product_id, quantity, created_at, updated_at";

/// 주문 저장소.
pub struct OrderRepository;

impl OrderRepository {
    /// 주문 목록. `user_id`가 주어지면 해당 사용자의 주문만 조회.
    pub async fn list(
        pool: &PgPool,
        user_id: Option<i64>,
    ) -> Result<Vec<OrderDetail>, sqlx::Error> {
        let rows = sqlx::query_as::<_, OrderDetailRow>(&format!(
            "{DETAIL_SELECT} WHERE ($1::BIGINT IS NULL OR o.user_id = $1) ORDER BY o.id"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(OrderDetail::from).collect())
    }

    /// 상세 조회.
    pub async fn get_detail(pool: &PgPool, id: i64) -> Result<Option<OrderDetail>, sqlx::Error> {
        let row = sqlx::query_as::<_, OrderDetailRow>(&format!("{DETAIL_SELECT} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(OrderDetail::from))
    }

    /// 주문 레코드 조회 (소유자 확인용).
    pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// 주문 생성.
    pub async fn create(pool: &PgPool, input: NewOrder) -> Result<Order, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(input.user_id)
        .bind(input.product_id)
        .bind(input.quantity)
        .fetch_one(pool)
        .await
    }

    /// 주문 부분 수정.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        update: OrderUpdate,
    ) -> Result<Option<Order>, sqlx::Error> {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET product_id = COALESCE($2, product_id),
                quantity = COALESCE($3, quantity),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.product_id)
        .bind(update.quantity)
        .fetch_optional(pool)
        .await
    }

    /// 주문 삭제. 삭제된 행이 있으면 `true`.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
