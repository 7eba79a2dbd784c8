//! Client for the relay's admin endpoints, used by the issuance side.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::{normalize_admin_path, DEFAULT_ADMIN_PATH};
use crate::ChallengeRecord;

pub use reqwest::Response;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SetStatus {
    Stored,
    /// The relay answered 507 because its registry is full. Under the advisory
    /// policy the record was still stored; under the strict policy it was not.
    OverCapacity,
}

#[derive(Copy, Clone)]
pub enum Method {
    Post,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Clone)]
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
    admin_path: String,
}

impl RelayClient {
    /// `base_url` is the relay's origin, e.g. `http://proxy.internal:4080`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, ClientError> {
        Self::with_client(base_url, reqwest::Client::builder().build()?)
    }

    pub fn with_client(
        base_url: impl AsRef<str>,
        client: reqwest::Client,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.as_ref().trim_end_matches('/').to_string();
        let url =
            reqwest::Url::parse(&base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if url.host_str().is_none() {
            return Err(ClientError::UndefinedHost);
        }
        Ok(Self {
            client,
            base_url,
            admin_path: DEFAULT_ADMIN_PATH.to_string(),
        })
    }

    pub fn admin_path(mut self, admin_path: impl AsRef<str>) -> Self {
        self.admin_path = normalize_admin_path(admin_path.as_ref());
        self
    }

    fn token_url(&self) -> String {
        format!("{}{}", self.base_url, self.admin_path)
    }

    fn upload_url(&self) -> String {
        format!("{}{}upload", self.base_url, self.admin_path)
    }

    async fn token_request(
        &self,
        method: Method,
        record: &ChallengeRecord,
    ) -> Result<Response, ClientError> {
        let response = self
            .client
            .request(method.into(), self.token_url())
            .json(record)
            .send()
            .await?;
        Ok(response)
    }

    /// Publishes a challenge record.
    pub async fn set(&self, record: &ChallengeRecord) -> Result<SetStatus, ClientError> {
        let response = self.token_request(Method::Post, record).await?;
        match response.status() {
            StatusCode::INSUFFICIENT_STORAGE => {
                log::warn!("relay token store is full while setting {}", record.domain);
                Ok(SetStatus::OverCapacity)
            }
            status if status.is_success() => Ok(SetStatus::Stored),
            _ => Err(non_2xx(response).await),
        }
    }

    /// Retracts the challenge record of `domain`.
    pub async fn delete(&self, domain: &str) -> Result<(), ClientError> {
        let record = ChallengeRecord {
            domain: domain.to_string(),
            ..Default::default()
        };
        let response = self.token_request(Method::Delete, &record).await?;
        if !response.status().is_success() {
            return Err(non_2xx(response).await);
        }
        Ok(())
    }

    /// Uploads `files` as `(file_name, content)` pairs into `domain`'s directory.
    pub async fn upload<I, N, C>(&self, domain: &str, files: I) -> Result<(), ClientError>
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<Vec<u8>>,
    {
        let mut form = Form::new().text("domain", domain.to_string());
        for (name, content) in files {
            form = form.part("file", Part::bytes(content.into()).file_name(name.into()));
        }
        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(non_2xx(response).await);
        }
        Ok(())
    }

    /// Reads each path and uploads it under its file name.
    pub async fn upload_paths(
        &self,
        domain: &str,
        paths: &[impl AsRef<Path>],
    ) -> Result<(), ClientError> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| ClientError::InvalidFileName(path.display().to_string()))?;
            files.push((name.to_string(), tokio::fs::read(path).await?));
        }
        self.upload(domain, files).await
    }
}

async fn non_2xx(response: Response) -> ClientError {
    let status_code = response.status().as_u16();
    match response.text().await {
        Ok(body) => ClientError::Non2xxStatus { status_code, body },
        Err(e) => e.into(),
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.into())
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("io error: {0:?}")]
    Io(#[from] std::io::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http error: {0:?}")]
    Http(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("non 2xx http status: {status_code} {body:?}")]
    Non2xxStatus { status_code: u16, body: String },
    #[error("could not determine host from url")]
    UndefinedHost,
    #[error("file name is not valid utf-8: {0}")]
    InvalidFileName(String),
}
