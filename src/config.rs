use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::any;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::challenge::{self, ACME_CHALLENGE_PATH};
use crate::stores::{
    CapacityPolicy, CompositeStore, DirUploadStore, MemoryChallengeStore, DEFAULT_MAX_TOKENS,
};
use crate::{token_api, upload, Store};

pub const DEFAULT_ADMIN_PATH: &str = "/token_poster/";
pub const DEFAULT_MAX_UPLOAD_FILE_SIZE: usize = 1024 * 1024;
pub const DEFAULT_MAX_UPLOAD_FORM_SIZE: usize = 10 << 20;

/// The store [RelayConfig::router] builds when none is supplied.
pub type DefaultStore = CompositeStore<MemoryChallengeStore, DirUploadStore>;

/// Settings of a relay, consumed by [RelayConfig::router] or [RelayConfig::serve].
///
/// ```rust,no_run
/// use http01_relay::{CapacityPolicy, RelayConfig};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let listener = tokio::net::TcpListener::bind("localhost:4080").await?;
/// RelayConfig::new("/var/lib/http01-relay/upload")
///     .admin_path("/token_poster/")
///     .capacity_policy(CapacityPolicy::Strict)
///     .serve(listener, std::future::pending())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct RelayConfig {
    upload_dir: PathBuf,
    admin_path: String,
    max_tokens: usize,
    capacity_policy: CapacityPolicy,
    max_upload_file_size: usize,
    max_upload_form_size: usize,
}

pub(crate) fn normalize_admin_path(admin_path: &str) -> String {
    let admin_path = admin_path.trim_matches('/');
    if admin_path.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", admin_path)
    }
}

pub(crate) struct RelayState<S> {
    pub(crate) store: S,
    pub(crate) max_upload_file_size: usize,
}

impl RelayConfig {
    pub fn new(upload_dir: impl AsRef<Path>) -> Self {
        Self {
            upload_dir: upload_dir.as_ref().to_path_buf(),
            admin_path: DEFAULT_ADMIN_PATH.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            capacity_policy: CapacityPolicy::default(),
            max_upload_file_size: DEFAULT_MAX_UPLOAD_FILE_SIZE,
            max_upload_form_size: DEFAULT_MAX_UPLOAD_FORM_SIZE,
        }
    }

    /// Mount point of the token admin API. The upload endpoint lives at
    /// `<admin_path>upload`. Missing leading or trailing slashes are added.
    pub fn admin_path(mut self, admin_path: impl AsRef<str>) -> Self {
        self.admin_path = normalize_admin_path(admin_path.as_ref());
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn capacity_policy(mut self, capacity_policy: CapacityPolicy) -> Self {
        self.capacity_policy = capacity_policy;
        self
    }

    pub fn max_upload_file_size(mut self, max_upload_file_size: usize) -> Self {
        self.max_upload_file_size = max_upload_file_size;
        self
    }

    pub fn max_upload_form_size(mut self, max_upload_form_size: usize) -> Self {
        self.max_upload_form_size = max_upload_form_size;
        self
    }

    pub fn upload_route(&self) -> String {
        format!("{}upload", self.admin_path)
    }

    pub fn store(&self) -> DefaultStore {
        CompositeStore::new(
            MemoryChallengeStore::with_capacity(self.max_tokens, self.capacity_policy),
            DirUploadStore::new(&self.upload_dir),
        )
    }

    pub fn router(self) -> Router {
        let store = self.store();
        self.router_with_store(store)
    }

    pub fn router_with_store<S: Store + 'static>(self, store: S) -> Router {
        log::info!("Serving with {}", store);
        let upload_route = self.upload_route();
        let state = Arc::new(RelayState {
            store,
            max_upload_file_size: self.max_upload_file_size,
        });
        Router::new()
            .route(ACME_CHALLENGE_PATH, any(challenge::respond::<S>))
            .route(
                &format!("{}{{*token}}", ACME_CHALLENGE_PATH),
                any(challenge::respond::<S>),
            )
            .route(&self.admin_path, any(token_api::handle::<S>))
            .route(
                &upload_route,
                any(upload::handle::<S>).layer(DefaultBodyLimit::max(self.max_upload_form_size)),
            )
            .with_state(state)
    }

    /// Serves the default router on `listener` until `shutdown` resolves.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServeError> {
        log::info!("Upload file path {}", self.upload_dir.display());
        log::info!("Token post path {}", self.admin_path);
        log::info!("Listening on {}", listener.local_addr()?);
        let app = self.router();
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("io error: {0:?}")]
    Io(#[from] std::io::Error),
}
