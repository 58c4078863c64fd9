//! 헬스 체크 endpoint.
//!
//! - `GET /health` - liveness. 프로세스가 응답하면 200
//! - `GET /health/ready` - readiness. 설정된 의존성이 하나라도 내려가 있으면 503

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

/// 서비스 전체 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
}

/// 의존성 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComponentState {
    Up,
    Down,
    /// 설정되지 않음 (메모리 모드의 데이터베이스 등). 준비 상태에 영향 없음
    NotConfigured,
}

/// 개별 의존성 보고.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    pub status: ComponentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    fn probe(configured: bool, healthy: bool, failure: &str) -> Self {
        match (configured, healthy) {
            (false, _) => Self {
                status: ComponentState::NotConfigured,
                message: None,
            },
            (true, true) => Self {
                status: ComponentState::Up,
                message: None,
            },
            (true, false) => Self {
                status: ComponentState::Down,
                message: Some(failure.to_string()),
            },
        }
    }

    fn is_down(&self) -> bool {
        self.status == ComponentState::Down
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    pub database: ComponentStatus,
    pub user_store: ComponentStatus,
}

impl ComponentHealth {
    fn overall(&self) -> ServiceStatus {
        if self.database.is_down() || self.user_store.is_down() {
            ServiceStatus::Degraded
        } else {
            ServiceStatus::Healthy
        }
    }
}

/// readiness 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub version: String,
    /// 서버 업타임(초)
    pub uptime_secs: i64,
    /// RFC 3339
    pub timestamp: String,
    pub components: ComponentHealth,
}

/// liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "서버 응답 가능"))
)]
pub async fn health_check() -> &'static str {
    "OK"
}

/// readiness probe.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "준비 완료", body = HealthResponse),
        (status = 503, description = "의존성 장애", body = HealthResponse)
    )
)]
pub async fn health_ready(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let has_db = state.db_pool.is_some();
    let components = ComponentHealth {
        database: ComponentStatus::probe(has_db, has_db && state.is_db_healthy().await, "연결 실패"),
        user_store: ComponentStatus::probe(
            true,
            state.users.is_healthy().await,
            "사용자 저장소 응답 없음",
        ),
    };

    let status = components.overall();
    let code = match status {
        ServiceStatus::Healthy => StatusCode::OK,
        ServiceStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        components,
    };

    (code, Json(response))
}

/// `/health` 아래에 nest 되는 라우터.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[test]
    fn test_probe_states() {
        assert_eq!(
            ComponentStatus::probe(false, false, "x").status,
            ComponentState::NotConfigured
        );
        assert_eq!(ComponentStatus::probe(true, true, "x").status, ComponentState::Up);

        let down = ComponentStatus::probe(true, false, "연결 실패");
        assert_eq!(down.status, ComponentState::Down);
        assert_eq!(down.message.as_deref(), Some("연결 실패"));
    }

    #[test]
    fn test_not_configured_does_not_degrade() {
        let components = ComponentHealth {
            database: ComponentStatus::probe(false, false, ""),
            user_store: ComponentStatus::probe(true, true, ""),
        };
        assert_eq!(components.overall(), ServiceStatus::Healthy);

        let components = ComponentHealth {
            database: ComponentStatus::probe(true, false, "down"),
            user_store: ComponentStatus::probe(true, true, ""),
        };
        assert_eq!(components.overall(), ServiceStatus::Degraded);
    }

    #[tokio::test]
    async fn test_ready_in_memory_mode() {
        let state = Arc::new(create_test_state());
        let app = Router::new()
            .nest("/health", health_router())
            .with_state(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["components"]["database"]["status"], "not_configured");
        assert_eq!(json["components"]["user_store"]["status"], "up");
    }
}
