//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 공유됩니다.
//! 기동 이후 변경되는 필드는 없습니다.

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{MemoryUserStore, PgUserStore, TokenService, UserStore};
use crate::error::ApiError;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 토큰 발급/검증 서비스 (서명 키 포함, 읽기 전용)
    pub tokens: Arc<TokenService>,

    /// 사용자 저장소 - 인증 게이트와 사용자 라우트가 사용
    pub users: Arc<dyn UserStore>,

    /// 데이터베이스 연결 풀 (상품/주문 라우트)
    pub db_pool: Option<PgPool>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 지정한 사용자 저장소로 상태 생성. DB 풀은 없음.
    pub fn new(tokens: TokenService, users: Arc<dyn UserStore>) -> Self {
        Self {
            tokens: Arc::new(tokens),
            users,
            db_pool: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 메모리 사용자 저장소로 상태 생성.
    pub fn in_memory(tokens: TokenService) -> Self {
        Self::new(tokens, Arc::new(MemoryUserStore::new()))
    }

    /// 데이터베이스 연결 설정.
    ///
    /// 사용자 저장소도 PostgreSQL 기반으로 교체됩니다.
    pub fn with_db_pool(mut self, pool: PgPool) -> Self {
        self.users = Arc::new(PgUserStore::new(pool.clone()));
        self.db_pool = Some(pool);
        self
    }

    /// DB 풀 참조. 미설정이면 503 에러.
    pub fn db(&self) -> Result<&PgPool, ApiError> {
        self.db_pool.as_ref().ok_or(ApiError::DatabaseUnavailable)
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// 데이터베이스 연결 상태 확인.
    pub async fn is_db_healthy(&self) -> bool {
        if let Some(pool) = &self.db_pool {
            sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
        } else {
            false
        }
    }
}

/// 테스트용 서명 키.
#[cfg(any(test, feature = "test-utils"))]
pub const TEST_JWT_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

/// 테스트용 AppState 생성 헬퍼.
///
/// DB 연결 없이 메모리 사용자 저장소를 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    let tokens = TokenService::new(TEST_JWT_SECRET).expect("test secret is non-empty");
    AppState::in_memory(tokens)
}
