//! 설정 관리.
//!
//! 설정은 다음 순서로 덮어씁니다:
//!
//! 1. 구조체 기본값
//! 2. 설정 파일 (`config/default.toml`, 없어도 됨)
//! 3. `SHOP__` 접두사 환경 변수 (예: `SHOP__SERVER__PORT=8080`)
//! 4. 관례적인 단일 환경 변수: `JWT_SECRET`, `DATABASE_URL`, `PORT`

use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 토큰 유효 시간 상한 (1년).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 인증 설정
    pub auth: AuthConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 정적 파일 설정
    pub storage: StorageConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 전체 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 쉼표로 구분된 CORS 허용 origin 목록 (없으면 모두 허용)
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    /// 소켓 주소 반환.
    ///
    /// # Errors
    /// `host:port` 형식이 유효하지 않으면 `AddrParseError`를 반환합니다.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL (없으면 메모리 사용자 저장소로 동작)
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 획득 타임아웃 (초)
    pub connection_timeout_secs: u64,
    /// 유휴 타임아웃 (초)
    pub idle_timeout_secs: u64,
    /// 기동 시 마이그레이션 실행 여부
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connection_timeout_secs: 10,
            idle_timeout_secs: 300,
            run_migrations: true,
        }
    }
}

/// 인증 설정.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT HMAC 서명 키
    pub jwt_secret: Option<String>,
    /// 토큰 유효 시간 (시간)
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: 24,
        }
    }
}

impl AuthConfig {
    /// 공백이 아닌 서명 키 반환.
    ///
    /// # Errors
    /// 키가 없거나 비어 있으면 [`ConfigError::MissingJwtSecret`].
    pub fn require_secret(&self) -> ConfigResult<&str> {
        match self.jwt_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => Ok(secret),
            _ => Err(ConfigError::MissingJwtSecret),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "jwt_secret",
                &self.jwt_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨 필터
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "shop_api=info,shop_core=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 정적 파일 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 상품 이미지 디렉터리 (`/uploads`로 서빙)
    pub uploads_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: "uploads".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 설정 파일은 선택 사항입니다.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("SHOP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("auth.jwt_secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("server.port", std::env::var("PORT").ok())?;

        Self::from_builder(builder)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> ConfigResult<Self> {
        Self::load(DEFAULT_CONFIG_PATH)
    }

    /// 구성된 빌더에서 설정을 만들고 검증합니다.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> ConfigResult<Self> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 값 범위 검증.
    ///
    /// 서명 키 존재 여부는 토큰 서비스 생성 시점에 검사합니다.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.auth.token_ttl_hours) {
            return Err(ConfigError::Invalid(format!(
                "auth.token_ttl_hours must be within 1..={}, got {}",
                MAX_TOKEN_TTL_HOURS, self.auth.token_ttl_hours
            )));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
