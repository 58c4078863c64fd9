//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::auth::StoreError;

/// 통합 API 에러 응답.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "product not found"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "VALIDATION_ERROR", "UNAUTHORIZED", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// 핸들러 에러.
///
/// 내부 에러(DB, 해싱 등)의 상세 내용은 로그에만 남기고 응답에는 일반 메시지를 보냅니다.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 요청 본문 형식 오류
    #[error("{0}")]
    Validation(String),

    /// 필드 검증 실패
    #[error("validation failed")]
    InvalidFields(#[from] ValidationErrors),

    /// 중복 리소스 (이미 등록된 이메일 등)
    #[error("{0}")]
    Duplicate(String),

    /// 로그인 실패. 이메일 미존재와 비밀번호 불일치를 구분하지 않음
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    /// DB 풀이 구성되지 않음
    #[error("database not available")]
    DatabaseUnavailable,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{} not found", what))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP 상태 코드.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidFields(_) | Self::Duplicate(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 응답 본문.
    pub fn to_response(&self) -> ApiErrorResponse {
        match self {
            Self::Validation(msg) => ApiErrorResponse::new("VALIDATION_ERROR", msg.clone()),
            Self::InvalidFields(errors) => ApiErrorResponse::with_details(
                "VALIDATION_ERROR",
                "invalid request body",
                serde_json::to_value(errors).unwrap_or(Value::Null),
            ),
            Self::Duplicate(msg) => ApiErrorResponse::new("DUPLICATE", msg.clone()),
            Self::InvalidCredentials => {
                ApiErrorResponse::new("INVALID_CREDENTIALS", "invalid credentials")
            }
            Self::NotFound(msg) => ApiErrorResponse::new("NOT_FOUND", msg.clone()),
            Self::Forbidden(msg) => ApiErrorResponse::new("FORBIDDEN", msg.clone()),
            Self::DatabaseUnavailable => {
                ApiErrorResponse::new("DATABASE_UNAVAILABLE", "database not available")
            }
            Self::Database(_) => ApiErrorResponse::new("DB_ERROR", "database error"),
            Self::Internal(_) => ApiErrorResponse::new("INTERNAL_ERROR", "internal server error"),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => Self::Duplicate(e.to_string()),
            StoreError::Database(e) => Self::Database(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!(error = %self, "Request failed");
        }

        (status, Json(self.to_response())).into_response()
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

/// JSON 본문을 역직렬화한 뒤 `validator` 규칙으로 검증하는 추출기.
///
/// 형식 오류와 검증 실패 모두 400 `VALIDATION_ERROR`로 거부합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::Validation(rejection.body_text()))?;

        value.validate()?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_response_serialization() {
        let error = ApiErrorResponse::new("NOT_FOUND", "product not found");
        let json = serde_json::to_string(&error).unwrap();

        assert!(!json.contains("details"));
        assert!(json.contains(r#""code":"NOT_FOUND""#));
        assert!(json.contains(r#""message":"product not found""#));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Duplicate("email already in use".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::not_found("order").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::forbidden("no").status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::DatabaseUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_error_conversion() {
        let err = ApiError::from(StoreError::DuplicateEmail);
        assert!(matches!(err, ApiError::Duplicate(ref msg) if msg == "email already in use"));
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let body = ApiError::internal("argon2 exploded").to_response();
        assert_eq!(body.code, "INTERNAL_ERROR");
        assert!(!body.message.contains("argon2"));
    }
}
