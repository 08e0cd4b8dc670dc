use std::io::Cursor;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::{error, info};

use crate::server::error::ApiError;
use crate::server::handlers;
use crate::server::SharedState;

pub type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn headers(pairs: &[(&str, &str)]) -> Vec<Header> {
    pairs
        .iter()
        .filter_map(|(k, v)| Header::from_bytes(k.as_bytes(), v.as_bytes()).ok())
        .collect()
}

fn cors_headers() -> Vec<Header> {
    headers(&[
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
        ("Access-Control-Allow-Headers", "Content-Type"),
    ])
}

fn raw_response(status: u16, content_type: &str, bytes: Vec<u8>) -> HttpResponse {
    let len = bytes.len();
    let mut all = headers(&[("Content-Type", content_type)]);
    all.extend(cors_headers());
    Response::new(StatusCode(status), all, Cursor::new(bytes), Some(len), None)
}

pub fn json_response<T: Serialize + ?Sized>(status: u16, body: &T) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(bytes) => raw_response(status, "application/json", bytes),
        Err(e) => {
            error!("Failed to serialize response body: {}", e);
            raw_response(500, "application/json", br#"{"error":"Internal server error"}"#.to_vec())
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

pub fn error_json(status: u16, message: &str) -> HttpResponse {
    json_response(status, &ErrorBody { error: message })
}

pub fn api_error(err: &ApiError) -> HttpResponse {
    error_json(err.status(), &err.to_string())
}

pub fn not_found() -> HttpResponse {
    error_json(404, "Not found")
}

fn method_not_allowed() -> HttpResponse {
    error_json(405, "Method not allowed")
}

fn preflight() -> HttpResponse {
    Response::new(StatusCode(204), cors_headers(), Cursor::new(Vec::new()), Some(0), None)
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Routes one request and sends the response.
///
/// A panic anywhere below is turned into a 500 JSON error so the client
/// always receives a well-formed reply.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let path = request
        .url()
        .split('?')
        .next()
        .unwrap_or_default()
        .to_owned();

    let response = catch_unwind(AssertUnwindSafe(|| route(&method, &path, &mut request, &state)))
        .unwrap_or_else(|panic| {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".into());
            error!("Handler for {} {} panicked: {}", method, path, reason);
            error_json(500, "Internal server error")
        });

    info!("{} {} -> {}", method, path, response.status_code().0);
    let _ = request.respond(response);
}

fn route(method: &Method, path: &str, request: &mut Request, state: &SharedState) -> HttpResponse {
    match (method, path) {
        (Method::Options, _) => preflight(),

        (Method::Post, "/predict") => handlers::predict::handle(request, state),
        (Method::Get, "/api/commodity-prices") => handlers::prices::handle(state),
        (Method::Get, "/health") => handlers::health::handle(state),

        (_, "/predict" | "/api/commodity-prices" | "/health") => method_not_allowed(),
        _ => not_found(),
    }
}
