//! Multipart upload of artifacts into a per-domain directory.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::RelayState;
use crate::request::client_addr;
use crate::{sniff, Store, UploadError};

struct UploadFile {
    name: String,
    content: Bytes,
}

#[derive(Default)]
struct UploadForm {
    domains: Vec<String>,
    files: Vec<UploadFile>,
}

/// Reads the whole form before anything touches the disk, so the domain is
/// checked even when it arrives after the files. The overall size is capped
/// by the `DefaultBodyLimit` on the route.
async fn read_form(mut multipart: Multipart) -> Result<UploadForm, UploadError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Form(e.body_text()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("domain") => {
                let domain = field
                    .text()
                    .await
                    .map_err(|e| UploadError::Form(e.body_text()))?;
                form.domains.push(domain);
            }
            Some("file") => {
                // a part without a filename is a plain value, not a file
                let Some(name) = field.file_name().map(str::to_owned) else {
                    continue;
                };
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| UploadError::Form(e.body_text()))?;
                form.files.push(UploadFile { name, content });
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Returns the single domain of the form if it plausibly names a DNS host.
pub(crate) fn validate_domain(domains: &[String]) -> Result<&str, UploadError> {
    let [domain] = domains else {
        return Err(UploadError::InvalidDomain(format!(
            "domain given {} times, expected once",
            domains.len()
        )));
    };
    let valid = !domain.is_empty()
        && domain.contains('.')
        && !domain.contains("..")
        && !domain.contains(['/', '\\', '\0'])
        && !domain.chars().any(char::is_whitespace);
    if valid {
        Ok(domain.as_str())
    } else {
        Err(UploadError::InvalidDomain(domain.clone()))
    }
}

pub(crate) async fn handle<S: Store + 'static>(
    State(state): State<Arc<RelayState<S>>>,
    request: Request,
) -> Response {
    if request.method() != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let ip = client_addr(&request);

    let multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(rejection) => {
            log::info!("Upload: bad form from {}: {}", ip, rejection.body_text());
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(err) => {
            log::warn!("Upload: {} from {}, form too big or malformed", err, ip);
            return err.status().into_response();
        }
    };
    let domain = match validate_domain(&form.domains) {
        Ok(domain) => domain,
        Err(err) => {
            log::info!("Upload: {} from {}", err, ip);
            return err.status().into_response();
        }
    };

    for file in &form.files {
        if let Err(err) = write_file(&state, domain, file).await {
            match err.status() {
                StatusCode::INTERNAL_SERVER_ERROR => log::error!("upload: {}", err),
                _ => log::warn!("upload: {} from {}", err, ip),
            }
            return err.status().into_response();
        }
    }
    StatusCode::OK.into_response()
}

async fn write_file<S: Store>(
    state: &RelayState<S>,
    domain: &str,
    file: &UploadFile,
) -> Result<(), UploadError> {
    if file.content.len() > state.max_upload_file_size {
        return Err(UploadError::TooLarge {
            name: file.name.clone(),
            max: state.max_upload_file_size,
        });
    }
    log::info!(
        "Upload file {} with type {}",
        file.name,
        sniff::content_type(&file.name, &file.content)
    );
    state
        .store
        .store_file(domain, &file.name, &file.content)
        .await?;
    Ok(())
}
