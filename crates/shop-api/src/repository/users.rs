//! 사용자 저장소.
//!
//! users 테이블에 대한 데이터베이스 작업을 처리합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_core::Role;
use sqlx::{FromRow, PgPool};
use tracing::warn;
use utoipa::ToSchema;

/// 사용자 레코드.
///
/// 비밀번호 해시를 포함하므로 직렬화하지 않습니다. 응답에는 [`UserResponse`]를 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 사용자 응답.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

/// 주문 응답에 포함되는 사용자 요약.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// 새 사용자 생성 입력.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// 사용자 부분 수정 입력. `None` 필드는 유지됩니다.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

/// users 테이블 행.
///
/// role은 TEXT 컬럼이므로 문자열로 읽은 뒤 변환합니다.
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let role = Role::parse(&row.role).unwrap_or_else(|| {
            warn!(user_id = row.id, role = %row.role, "Unknown role in database, treating as user");
            Role::User
        });

        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// 이메일 정규화 (공백 제거, 소문자).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 사용자 저장소.
pub struct UserRepository;

impl UserRepository {
    /// ID로 조회.
    pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// 이메일로 조회 (대소문자 무시).
    pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// 전체 사용자 목록.
    pub async fn list(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id"
        ))
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// 새 사용자 생성.
    ///
    /// 이메일 중복 시 unique violation 에러가 그대로 반환됩니다.
    pub async fn create(pool: &PgPool, input: NewUser) -> Result<User, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(normalize_email(&input.email))
        .bind(&input.password_hash)
        .bind(input.role.as_str())
        .fetch_one(pool)
        .await?;

        Ok(row.into())
    }

    /// 사용자 부분 수정.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        update: UserUpdate,
    ) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                role = COALESCE($5, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.name)
        .bind(update.email.as_deref().map(normalize_email))
        .bind(update.password_hash)
        .bind(update.role.map(|r| r.as_str()))
        .fetch_optional(pool)
        .await?;

        Ok(row.map(User::from))
    }

    /// 사용자 삭제. 삭제된 행이 있으면 `true`.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
