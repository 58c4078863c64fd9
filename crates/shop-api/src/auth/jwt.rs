//! JWT 토큰 처리.
//!
//! HS256 서명 토큰 발급/검증 로직. 서명 키는 기동 시 한 번 주입되며
//! 요청마다 환경 변수를 다시 읽지 않습니다.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use shop_core::{AuthConfig, ConfigError, Identity, Role, MAX_TOKEN_TTL_HOURS};

/// 기본 토큰 유효 시간 (시간).
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// JWT 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// 사용자 ID
    pub user_id: i64,
    /// 발급 시점의 사용자 역할
    pub role: Role,
    /// Issued At - 토큰 발급 시간 (Unix timestamp)
    pub iat: i64,
    /// Expiration - 토큰 만료 시간 (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 토큰 고유 식별자
    pub jti: String,
}

impl Claims {
    /// 현재 시각 기준으로 Claims 생성.
    pub fn new(user_id: i64, role: Role, ttl: Duration) -> Self {
        Self::issued_at(user_id, role, Utc::now(), ttl)
    }

    /// 지정한 발급 시각 기준으로 Claims 생성.
    ///
    /// 만료 시각이 표현 범위를 넘으면 최댓값으로 고정합니다.
    pub fn issued_at(user_id: i64, role: Role, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        let exp = issued_at
            .checked_add_signed(ttl)
            .map_or(DateTime::<Utc>::MAX_UTC.timestamp(), |t| t.timestamp());
        Self {
            user_id,
            role,
            iat: issued_at.timestamp(),
            exp,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// 토큰에 담긴 인증 주체.
    pub fn identity(&self) -> Identity {
        Identity::new(self.user_id, self.role)
    }

    /// 주어진 시각에 만료되었는지 확인 (`now >= exp`).
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// 토큰 검증 실패 유형.
///
/// 로그와 메트릭에만 사용하며, 클라이언트에게는 모두 같은 응답으로 보고합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    /// 서명된 토큰 형식으로 해석할 수 없음
    Malformed,
    /// 서명 불일치
    BadSignature,
    /// 만료됨
    Expired,
}

impl AuthErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::BadSignature => "bad_signature",
            Self::Expired => "expired",
        }
    }
}

/// 토큰 검증 에러.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("유효하지 않은 토큰: {}", kind.as_str())]
pub struct AuthError {
    kind: AuthErrorKind,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        let kind = match e.kind() {
            ErrorKind::InvalidSignature => AuthErrorKind::BadSignature,
            ErrorKind::ExpiredSignature => AuthErrorKind::Expired,
            _ => AuthErrorKind::Malformed,
        };
        Self::new(kind)
    }
}

/// JWT 토큰 생성 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("토큰 인코딩 실패: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),
}

/// 토큰 발급/검증 서비스.
///
/// 기동 시 한 번 생성되어 `AppState`에 공유되며 이후 변경되지 않습니다.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// 기본 유효 시간(24시간)으로 서비스 생성.
    ///
    /// # Errors
    /// 서명 키가 비어 있으면 [`ConfigError::MissingJwtSecret`].
    pub fn new(secret: &str) -> Result<Self, ConfigError> {
        Self::with_ttl(secret, Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }

    /// 유효 시간을 지정하여 서비스 생성.
    pub fn with_ttl(secret: &str, ttl: Duration) -> Result<Self, ConfigError> {
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }
        if ttl <= Duration::zero() {
            return Err(ConfigError::Invalid("token ttl must be positive".to_string()));
        }
        if ttl > Duration::hours(MAX_TOKEN_TTL_HOURS) {
            return Err(ConfigError::Invalid(format!(
                "token ttl must not exceed {} hours",
                MAX_TOKEN_TTL_HOURS
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    /// 인증 설정에서 서비스 생성.
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        let secret = config.require_secret()?;
        let ttl = Duration::try_hours(config.token_ttl_hours).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "auth.token_ttl_hours out of range: {}",
                config.token_ttl_hours
            ))
        })?;
        Self::with_ttl(secret, ttl)
    }

    /// 토큰 유효 시간.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 토큰 발급.
    ///
    /// `iat = now`, `exp = now + ttl`.
    pub fn issue(&self, user_id: i64, role: Role) -> Result<String, JwtError> {
        self.sign(&Claims::new(user_id, role, self.ttl))
    }

    /// 주어진 Claims 서명.
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(JwtError::from)
    }

    /// 토큰 검증 후 Claims 반환.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;

        // jsonwebtoken은 exp == now를 아직 유효하다고 보므로 경계를 직접 확인
        if data.claims.is_expired_at(Utc::now()) {
            return Err(AuthError::new(AuthErrorKind::Expired));
        }

        Ok(data.claims)
    }

    /// 토큰 검증 후 인증 주체 반환.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.decode(token).map(|claims| claims.identity())
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}
