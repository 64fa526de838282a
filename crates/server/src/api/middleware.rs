//! Per-request HTTP metrics.

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::metrics::{
    normalize_path, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION,
};

/// Keeps the in-flight gauge raised while a request is being served.
///
/// Lowered on drop, so a request whose client disconnects mid-handler is
/// not left counted.
struct InFlight;

impl InFlight {
    fn enter() -> Self {
        HTTP_REQUESTS_IN_FLIGHT.inc();
        Self
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        HTTP_REQUESTS_IN_FLIGHT.dec();
    }
}

/// Labels requests by method, route and status code; program names in the
/// path collapse to `{name}`.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let route = normalize_path(request.uri().path());
    let started = Instant::now();

    let response = {
        let _in_flight = InFlight::enter();
        next.run(request).await
    };

    let status = response.status();
    let labels = [method.as_str(), route.as_str(), status.as_str()];
    HTTP_REQUEST_DURATION
        .with_label_values(&labels)
        .observe(started.elapsed().as_secs_f64());
    HTTP_REQUESTS_TOTAL.with_label_values(&labels).inc();

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::put, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/programs/{name}/selection", put(|| async { "selected" }))
            .layer(middleware::from_fn(metrics_middleware))
    }

    fn requests_total(method: &str, route: &str, status: &str) -> u64 {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&[method, route, status])
            .get()
    }

    #[tokio::test]
    async fn test_program_names_share_one_label() {
        let before = requests_total("PUT", "/programs/{name}/selection", "200");

        for program in ["VLC", "Mozilla%20Firefox"] {
            let response = app()
                .oneshot(
                    Request::put(format!("/programs/{}/selection", program))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let after = requests_total("PUT", "/programs/{name}/selection", "200");
        assert_eq!(after, before + 2);
    }

    #[tokio::test]
    async fn test_unrouted_requests_are_counted() {
        let before = requests_total("GET", "/nowhere", "404");

        let response = app()
            .oneshot(Request::get("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(requests_total("GET", "/nowhere", "404"), before + 1);
    }
}
