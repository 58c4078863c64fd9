//! CLI 명령어 구현 모듈.

pub mod create_admin;
pub mod migrate;
pub mod seed;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

/// `--db-url` 플래그, 없으면 설정의 `database.url`로 연결.
pub async fn connect(db_url: Option<String>, configured: Option<&str>) -> Result<PgPool> {
    let db_url = db_url
        .or_else(|| configured.map(str::to_string))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "DATABASE_URL not found. Set DATABASE_URL environment variable or use --db-url flag"
            )
        })?;

    info!("Connecting to database...");
    PgPool::connect(&db_url)
        .await
        .context("Failed to connect to database")
}
