//! # skynotify
//!
//! Edit Bluesky notification preferences locally and push them to your PDS.
//!
//! The document, its validation and the local store live in
//! [`skynotify_common`]; this crate adds the remote side: an XRPC transport,
//! the `putPreferencesV2` and `getProfile` calls, and an [`Applier`] that keeps
//! at most one apply in flight.
//!
//! ```no_run
//! use skynotify::{Applier, StaticAuth, XrpcApi};
//! use skynotify_common::notify::TracingNotifier;
//! use skynotify_common::{ConfigStore, FileStore};
//!
//! # #[tokio::main]
//! # async fn main() -> miette::Result<()> {
//! let config = ConfigStore::new(FileStore::new("skynotify.json"), TracingNotifier);
//! let applier = Applier::new(
//!     StaticAuth::signed_out(),
//!     XrpcApi::new(reqwest::Client::new()),
//!     TracingNotifier,
//! );
//! applier.apply(&config.load()).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod apply;
pub mod auth;
pub mod error;
pub mod http_client;
pub mod xrpc;

pub use api::{PreferencesApi, Profile, ProfileApi, XrpcApi};
pub use apply::{Applier, ApplyError};
pub use auth::{AuthProvider, Session, StaticAuth};
pub use error::ApiError;
pub use skynotify_common;
