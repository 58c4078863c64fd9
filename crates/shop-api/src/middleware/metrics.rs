//! HTTP 요청 metrics middleware.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{
    normalize_path, record_http_duration, record_http_request, record_http_response,
};

/// 수집 대상에서 제외하는 경로 (Prometheus 스크레이프 자체).
const EXCLUDED_PATHS: &[&str] = &["/metrics"];

fn is_excluded(path: &str) -> bool {
    EXCLUDED_PATHS.contains(&path)
}

/// 요청 수, 응답 수(상태 코드별), 처리 시간을 기록합니다.
///
/// 경로 라벨의 숫자 세그먼트는 `:id`로 묶어 라벨 수를 제한합니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    if is_excluded(request.uri().path()) {
        return next.run(request).await;
    }

    let method = request.method().as_str().to_owned();
    let path = normalize_path(request.uri().path());
    record_http_request(&method, &path);

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed();

    record_http_response(&method, &path, response.status().as_u16());
    record_http_duration(&method, &path, elapsed.as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/metrics", get(|| async { "# scrape" }))
            .route("/api/orders/{id}", get(|| async { "order" }))
            .route("/api/orders", post(|| async { StatusCode::CREATED }))
            .layer(middleware::from_fn(metrics_layer))
    }

    async fn status(method: &str, uri: &str) -> StatusCode {
        app()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn test_scrape_path_excluded() {
        assert!(is_excluded("/metrics"));
        assert!(!is_excluded("/api/products"));
    }

    #[tokio::test]
    async fn test_response_status_preserved() {
        assert_eq!(status("GET", "/api/orders/42").await, StatusCode::OK);
        assert_eq!(status("POST", "/api/orders").await, StatusCode::CREATED);
        assert_eq!(status("GET", "/metrics").await, StatusCode::OK);
        assert_eq!(status("GET", "/missing").await, StatusCode::NOT_FOUND);
    }
}
