//! 상품 저장소.
//!
//! 상품 조회/필터링과 관리자용 생성/수정/삭제를 처리합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use utoipa::{IntoParams, ToSchema};

/// 상품 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    /// 정적 파일 경로 (예: "uploads/iphone.jpg")
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 새 상품 생성 입력.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub image: Option<String>,
}

/// 상품 부분 수정 입력. `None` 필드는 유지됩니다.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
}

/// 상품 목록 필터.
///
/// 모든 조건은 선택적이며 AND로 결합됩니다.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// 제목/설명 부분 일치 (대소문자 무시)
    pub q: Option<String>,
    /// 카테고리 일치 (대소문자 무시)
    pub category: Option<String>,
    /// 최소 가격 (포함)
    #[serde(alias = "minPrice")]
    pub min_price: Option<Decimal>,
    /// 최대 가격 (포함)
    #[serde(alias = "maxPrice")]
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    /// 빈 문자열 조건은 조건 없음으로 취급.
    pub fn normalized(self) -> Self {
        fn non_empty(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            q: non_empty(self.q),
            category: non_empty(self.category),
            ..self
        }
    }
}

/// 검색어를 부분 일치 ILIKE 패턴으로 변환 (`\`, `%`, `_`는 문자 그대로).
fn contains_pattern(q: &str) -> String {
    let mut pattern = String::with_capacity(q.len() + 2);
    pattern.push('%');
    for c in q.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

const PRODUCT_COLUMNS: &str =
    "id, title, price, description, category, image, created_at, updated_at";

/// 상품 저장소.
pub struct ProductRepository;

impl ProductRepository {
    /// 필터 조건으로 상품 목록 조회 (ID 순).
    pub async fn list(pool: &PgPool, filter: &ProductFilter) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::TEXT IS NULL
                   OR title ILIKE $1 ESCAPE '\'
                   OR description ILIKE $1 ESCAPE '\')
              AND ($2::TEXT IS NULL OR LOWER(category) = LOWER($2))
              AND ($3::NUMERIC IS NULL OR price >= $3)
              AND ($4::NUMERIC IS NULL OR price <= $4)
            ORDER BY id
            "#
        ))
        .bind(filter.q.as_deref().map(contains_pattern))
        .bind(filter.category.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .fetch_all(pool)
        .await
    }

    /// ID로 조회.
    pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// 상품 존재 여부.
    pub async fn exists(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// 상품 생성.
    pub async fn create(pool: &PgPool, input: NewProduct) -> Result<Product, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (title, price, description, category, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&input.title)
        .bind(input.price)
        .bind(&input.description)
        .bind(&input.category)
        .bind(&input.image)
        .fetch_one(pool)
        .await
    }

    /// 상품 부분 수정.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        update: ProductUpdate,
    ) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET title = COALESCE($2, title),
                price = COALESCE($3, price),
                description = COALESCE($4, description),
                category = COALESCE($5, category),
                image = COALESCE($6, image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.title)
        .bind(update.price)
        .bind(update.description)
        .bind(update.category)
        .bind(update.image)
        .fetch_optional(pool)
        .await
    }

    /// 상품 삭제. 삭제된 행이 있으면 `true`.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 상품 전체 삭제 (시드 초기화용). 삭제된 행 수 반환.
    pub async fn delete_all(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products").execute(pool).await?;
        Ok(result.rows_affected())
    }
}
