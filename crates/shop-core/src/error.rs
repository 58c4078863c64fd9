//! 설정 에러 타입.
//!
//! 설정 에러는 모두 기동 시점에 발생하며, 서버는 이 에러가 있는 상태로
//! 요청을 받지 않습니다.

use thiserror::Error;

/// 설정 로드/검증 에러.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JWT 서명 키 누락 또는 빈 값
    #[error("JWT 서명 키가 설정되지 않았습니다 (JWT_SECRET)")]
    MissingJwtSecret,

    /// 잘못된 설정 값
    #[error("잘못된 설정 값: {0}")]
    Invalid(String),

    /// 설정 소스 로드 실패
    #[error("설정 로드 실패: {0}")]
    Load(#[from] config::ConfigError),
}

/// 설정 작업을 위한 Result 타입.
pub type ConfigResult<T> = Result<T, ConfigError>;
