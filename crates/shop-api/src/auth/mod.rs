//! 인증 및 권한 부여.
//!
//! # 구성 요소
//!
//! - [`hash_password`] / [`verify_password`]: Argon2 자격 증명 검증
//! - [`TokenService`]: HS256 토큰 발급/검증
//! - [`require_auth`]: Bearer 토큰 인증 게이트
//! - [`require_admin`]: 저장소 기반 역할 게이트
//! - [`UserStore`]: 게이트와 사용자 라우트가 사용하는 사용자 저장소

mod jwt;
mod middleware;
mod password;
mod store;

pub use jwt::{AuthError, AuthErrorKind, Claims, JwtError, TokenService, DEFAULT_TOKEN_TTL_HOURS};
pub use middleware::{
    authenticate, authorize, extract_bearer, require_admin, require_auth, AuthRejection, AuthUser,
};
pub use password::{hash_password, verify_password, verify_unknown_user, PasswordError};
pub use store::{MemoryUserStore, PgUserStore, StoreError, UserStore};
