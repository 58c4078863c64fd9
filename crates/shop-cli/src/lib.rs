//! 스토어프론트 운영 CLI.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 스키마 마이그레이션
//! - 샘플 상품 카탈로그 시드
//! - admin 계정 생성

pub mod commands;
