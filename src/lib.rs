//! A relay answering [ACME] http-01 challenges for domains whose DNS points at a shared proxy
//! host, while the certificate issuance client runs somewhere else.
//!
//! The issuance client publishes a `(domain, token, validation)` record through the token admin
//! API before asking the certificate authority to validate. When the authority later fetches
//! `http://<domain>/.well-known/acme-challenge/<token>`, the relay looks the record up by the
//! request's host and answers with the validation string, byte for byte. Once validation is
//! done the client deletes the record again.
//!
//! A second endpoint accepts multipart file uploads into a per-domain directory, e.g. to deliver
//! issued certificates back to the proxy host.
//!
//! ## Endpoints
//!
//! | path | method | result |
//! |---|---|---|
//! | `/.well-known/acme-challenge/{token}` | `GET` | 200 + validation, 404, 405 |
//! | `{admin_path}` | `POST` `{"domain","token","validation"}` | 200, 400, 405, 507 |
//! | `{admin_path}` | `DELETE` `{"domain"}` | 200, 400, 405 |
//! | `{admin_path}upload` | `POST` multipart `domain` + `file`... | 200, 400, 405, 500 |
//!
//! `admin_path` defaults to `/token_poster/`. The admin endpoints carry no authentication; they
//! must only be reachable from trusted networks.
//!
//! ```rust,no_run
//! use http01_relay::RelayConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     simple_logger::init_with_level(log::Level::Info).unwrap();
//!
//!     let listener = tokio::net::TcpListener::bind("[::]:4080").await.unwrap();
//!     RelayConfig::new("./upload")
//!         .serve(listener, async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Token registry
//!
//! Records live in memory only, in a [stores::MemoryChallengeStore] bounded by `max_tokens`
//! (10000 by default). What happens once it is full is a [CapacityPolicy]: by default the
//! write still happens and the admin API answers 507 as a warning, with
//! [CapacityPolicy::Strict] the write of a new domain is refused.
//!
//! Other backends may be plugged in by implementing [ChallengeStore] and [UploadStore]
//! (or combining two implementations with [stores::CompositeStore]) and passing the result to
//! [RelayConfig::router_with_store].
//!
//! ## Issuance side
//!
//! [client::RelayClient] wraps the admin API. The `http01-relay` binary exposes it as
//! `auth-hook` / `cleanup-hook` subcommands which read certbot's `CERTBOT_DOMAIN`,
//! `CERTBOT_TOKEN` and `CERTBOT_VALIDATION` variables.
//!
//! [ACME]: https://en.wikipedia.org/wiki/Automatic_Certificate_Management_Environment

mod challenge;
pub mod client;
mod config;
mod request;
pub mod sniff;
mod store;
pub mod stores;
mod token_api;
mod upload;

pub use challenge::ACME_CHALLENGE_PATH;
pub use config::*;
pub use store::*;
pub use stores::CapacityPolicy;
