//! Storefront API 서버 진입점.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use shop_api::metrics::setup_metrics_recorder;
use shop_api::middleware::metrics_layer;
use shop_api::openapi::swagger_ui_router;
use shop_api::repository::run_migrations;
use shop_api::routes::create_api_router;
use shop_api::state::AppState;
use shop_api::TokenService;
use shop_core::{init_logging, AppConfig, DatabaseConfig, LogConfig, ServerConfig};

/// 설정에 따라 AppState 생성.
///
/// `database.url`이 없으면 메모리 사용자 저장소로 동작합니다.
/// URL이 설정되어 있는데 연결할 수 없으면 기동을 중단합니다.
async fn create_app_state(
    tokens: TokenService,
    config: &DatabaseConfig,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let state = AppState::in_memory(tokens);

    let Some(url) = config.url.as_deref() else {
        warn!("DATABASE_URL not set, using in-memory user store; product/order routes disabled");
        return Ok(state);
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(url)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to connect to database");
            e
        })?;
    info!("Connected to PostgreSQL");

    if config.run_migrations {
        run_migrations(&pool).await?;
        info!("Database migrations applied");
    }

    Ok(state.with_db_pool(pool))
}

/// 쉼표로 구분된 origin 목록 파싱. 해석할 수 없는 항목은 건너뜁니다.
fn parse_origins(raw: Option<&str>) -> Vec<HeaderValue> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect()
}

/// CORS 레이어. origin 목록이 없으면 모두 허용하고 credential은 보내지 않습니다.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins = parse_origins(config.cors_origins.as_deref());

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        warn!("server.cors_origins not set, allowing any origin");
        base.allow_origin(AllowOrigin::any())
    } else {
        info!(count = origins.len(), "CORS origins configured");
        base.allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    config: &AppConfig,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let api_router = create_api_router(state.clone()).with_state(state);

    Router::new()
        .merge(metrics_router)
        .merge(api_router)
        .nest_service("/uploads", ServeDir::new(&config.storage.uploads_dir))
        .merge(swagger_ui_router())
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(cors_layer(&config.server))
}

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그 또는 `EXPORT_OPENAPI` 환경변수가 설정된 경우
/// OpenAPI JSON 스펙을 stdout으로 출력하고 종료합니다.
fn handle_export_openapi() -> Result<(), Box<dyn std::error::Error>> {
    use shop_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    let export_flag = std::env::args().any(|arg| arg == "--export-openapi");
    let export_env = std::env::var("EXPORT_OPENAPI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    if export_flag || export_env {
        let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
        println!("{}", json);
        std::process::exit(0);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    handle_export_openapi()?;

    let config = AppConfig::load_default()?;
    init_logging(LogConfig::from(&config.logging))?;

    info!("Starting Storefront API server...");

    // 서명 키가 없으면 트래픽을 받기 전에 종료
    let tokens = TokenService::from_config(&config.auth).map_err(|e| {
        error!(error = %e, "JWT_SECRET (auth.jwt_secret) must be set");
        e
    })?;

    let addr = config.server.socket_addr().map_err(|e| {
        error!(
            host = %config.server.host,
            port = config.server.port,
            error = %e,
            "소켓 주소 설정이 유효하지 않습니다. server.host, PORT 설정을 확인하세요."
        );
        e
    })?;

    let metrics_handle = setup_metrics_recorder()?;
    info!("Prometheus metrics recorder initialized");

    tokio::fs::create_dir_all(&config.storage.uploads_dir).await?;

    let state = Arc::new(create_app_state(tokens, &config.database).await?);
    info!(
        version = %state.version,
        has_db = state.db_pool.is_some(),
        token_ttl_hours = config.auth.token_ttl_hours,
        "Application state initialized"
    );

    let app = create_router(state, metrics_handle, &config);

    info!(%addr, "API server listening");
    info!("Swagger UI available at http://{}/swagger-ui", addr);
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM을 받을 때까지 대기합니다.
///
/// 시그널 핸들러 설치에 실패한 쪽은 영원히 대기하므로 다른 쪽 시그널로 종료됩니다.
async fn shutdown_signal() {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                error!(error = %e, "Ctrl+C handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let received = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };

    warn!(signal = received, "Shutdown requested, draining in-flight requests");
}
