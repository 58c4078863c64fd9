//! # Shop Core
//!
//! 스토어프론트 백엔드의 공통 타입, 설정, 로깅 인프라를 제공합니다.
//!
//! 이 크레이트는 API 서버와 CLI가 함께 사용하는 기본 요소를 담고 있습니다:
//! - 사용자 역할 및 인증 주체 타입
//! - 설정 로드 (기본값 → 설정 파일 → 환경 변수)
//! - 로깅 초기화
//! - 설정 에러 타입

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
