use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::header::HOST;
use axum::http::uri::Authority;
use axum::http::Request;

pub(crate) const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Address of the caller for log lines: the first `X-Forwarded-For` hop if a
/// proxy set one, else the transport peer.
pub(crate) fn client_addr<B>(request: &Request<B>) -> String {
    let forwarded = request
        .headers()
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(forwarded) = forwarded {
        return forwarded.to_string();
    }
    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => addr.to_string(),
        None => "unknown".to_string(),
    }
}

/// Host the request was addressed to, without a port.
pub(crate) fn request_host<B>(request: &Request<B>) -> Option<String> {
    let authority = match request.headers().get(HOST) {
        Some(value) => value.to_str().ok()?.parse::<Authority>().ok()?,
        None => request.uri().authority()?.clone(),
    };
    Some(authority.host().to_string())
}
