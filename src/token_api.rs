//! Admin endpoint through which the issuance client publishes and retracts
//! challenge records. Results are reported through the status code only.

use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::RelayState;
use crate::request::client_addr;
use crate::{ChallengeRecord, SetOutcome, Store};

/// Upper bound on an admin request body.
const MAX_TOKEN_BODY: usize = 64 * 1024;

fn bad_json() -> Response {
    (StatusCode::BAD_REQUEST, "Bad json request\n").into_response()
}

pub(crate) async fn handle<S: Store + 'static>(
    State(state): State<Arc<RelayState<S>>>,
    request: Request,
) -> Response {
    let ip = client_addr(&request);
    let method = request.method().clone();

    let body = match to_bytes(request.into_body(), MAX_TOKEN_BODY).await {
        Ok(body) => body,
        Err(err) => {
            log::info!("Unreadable token request from {}: {}", ip, err);
            return bad_json();
        }
    };
    let record: ChallengeRecord = match serde_json::from_slice(&body) {
        Ok(record) => record,
        Err(err) => {
            log::info!("Bad json token request from {}: {}", ip, err);
            return bad_json();
        }
    };

    match method {
        Method::POST => {
            if !record.is_complete() {
                return StatusCode::BAD_REQUEST.into_response();
            }
            let domain = record.domain.clone();
            match state.store.set(record).await {
                Ok(SetOutcome::Stored) => {
                    log::info!("Set token for {} from {}", domain, ip);
                    StatusCode::OK.into_response()
                }
                Ok(SetOutcome::StoredOverCapacity) => {
                    log::warn!(
                        "Hit token limit, someone is probably doing DoS, maybe from {}",
                        ip
                    );
                    log::info!("Set token for {} from {}", domain, ip);
                    StatusCode::INSUFFICIENT_STORAGE.into_response()
                }
                Ok(SetOutcome::Rejected) => {
                    log::warn!(
                        "Hit token limit, rejected token for {}, someone is probably doing DoS, maybe from {}",
                        domain,
                        ip
                    );
                    StatusCode::INSUFFICIENT_STORAGE.into_response()
                }
                Err(err) => {
                    log::error!("Set token for {} failed: {}", domain, err);
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
        Method::DELETE => {
            log::info!("Delete token for {} from {}", record.domain, ip);
            match state.store.delete(&record.domain).await {
                Ok(()) => StatusCode::OK.into_response(),
                Err(err) => {
                    log::error!("Delete token for {} failed: {}", record.domain, err);
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
        _ => {
            log::info!("{} method not allowed from {}", method, ip);
            StatusCode::METHOD_NOT_ALLOWED.into_response()
        }
    }
}
