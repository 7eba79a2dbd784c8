//! Answers the CA's probe on `/.well-known/acme-challenge/<token>`.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;

use crate::config::RelayState;
use crate::request::{client_addr, request_host};
use crate::Store;

/// Path prefix probed by the certificate authority.
pub const ACME_CHALLENGE_PATH: &str = "/.well-known/acme-challenge/";

/// Decoded remainder of the path after [ACME_CHALLENGE_PATH]. `None` when the
/// prefix is missing or the decoded bytes are not UTF-8.
fn requested_token(path: &str) -> Option<String> {
    let rest = path.strip_prefix(ACME_CHALLENGE_PATH)?;
    percent_decode_str(rest)
        .decode_utf8()
        .ok()
        .map(|token| token.into_owned())
}

/// Serves the stored validation when both the request host and the rest of
/// the path match a registered record. Anything else under the prefix, an
/// unknown host and a wrong token all yield a bare 404.
pub(crate) async fn respond<S: Store + 'static>(
    State(state): State<Arc<RelayState<S>>>,
    request: Request,
) -> Response {
    if request.method() != Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let token = requested_token(request.uri().path());
    let ip = client_addr(&request);
    let Some(host) = request_host(&request) else {
        log::info!("Request token without host from {}", ip);
        return StatusCode::NOT_FOUND.into_response();
    };
    log::info!("Request token for {} from {}", host, ip);

    match state.store.get(&host).await {
        Ok(Some(record)) if token.as_deref() == Some(record.token.as_str()) => {
            log::info!("Return token for {} to {}", host, ip);
            (
                StatusCode::OK,
                [(CONTENT_TYPE, "text/plain")],
                record.validation,
            )
                .into_response()
        }
        Ok(_) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            log::error!("token lookup for {} failed: {}", host, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
