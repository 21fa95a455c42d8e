use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::time::Instant;
use tracing::Instrument;

pub const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

fn insert_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        "access-control-allow-origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

/// Open CORS: any origin, with the browser client's headers allowed.
/// Pre-flight requests are answered here with an empty 200.
pub(crate) async fn cors_middleware(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut resp = StatusCode::OK.into_response();
        insert_cors_headers(resp.headers_mut());
        return resp;
    }

    let mut resp = next.run(req).await;
    insert_cors_headers(resp.headers_mut());
    resp
}

pub(crate) async fn request_tracing_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let route = req.uri().path().to_string();
    let started = Instant::now();

    let span = tracing::info_span!("http.request", method = %method, route = %route);
    let resp = next.run(req).instrument(span).await;

    tracing::info!(
        method = %method,
        route = %route,
        status = resp.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    resp
}
