//! 스키마 마이그레이션 적용.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

use shop_api::repository::run_migrations;

/// 대기 중인 마이그레이션을 모두 적용합니다.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    run_migrations(pool)
        .await
        .context("Failed to apply migrations")?;

    info!("Database migrations applied");
    Ok(())
}
