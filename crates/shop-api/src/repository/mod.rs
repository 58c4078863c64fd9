//! Repository pattern for database operations.
//!
//! 데이터베이스 접근 로직을 라우트 핸들러에서 분리하여 관리합니다.
//! 모든 Repository는 static methods 패턴을 사용합니다.

pub mod orders;
pub mod products;
pub mod users;

pub use orders::{NewOrder, Order, OrderDetail, OrderRepository, OrderUpdate};
pub use products::{NewProduct, Product, ProductFilter, ProductRepository, ProductUpdate};
pub use users::{NewUser, User, UserRepository, UserResponse, UserSummary, UserUpdate};

use sqlx::{migrate::MigrateError, PgPool};

/// `migrations/` 디렉터리의 스키마 마이그레이션 적용.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
