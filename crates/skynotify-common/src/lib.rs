//! Core types for skynotify: the Bluesky notification preference document,
//! its validation, and the local load/save round trip.
//!
//! ```
//! use skynotify_common::{ConfigStore, MemoryStore, PreferenceState};
//! use skynotify_common::edit::{Channel, Edit};
//! use skynotify_common::schema::PreferenceKey;
//!
//! let config = ConfigStore::new(MemoryStore::new(), ());
//! let mut state = PreferenceState::load(&config);
//! state.edit(&Edit::SetChannel {
//!     key: PreferenceKey::Like,
//!     channel: Channel::Push,
//!     enabled: false,
//! })?;
//! state.save(&config)?;
//! assert!(!config.load().like.push);
//! # Ok::<(), miette::Report>(())
//! ```

#![warn(missing_docs)]

/// Loading and saving the document through a key-value store.
pub mod config;
/// Pure updates to a document.
pub mod edit;
pub mod error;
/// User-facing notification sink.
pub mod notify;
/// Document types and validation.
pub mod schema;
/// Owned editing state.
pub mod state;
/// Key-value persistence backends.
pub mod store;

pub use config::{ConfigOptions, ConfigStore};
pub use error::{ConfigError, StoreError, ValidationError};
pub use notify::{NotificationKind, Notifier};
pub use schema::{
    FilterablePreference, Include, NotificationPreferences, Preference, PreferenceKey, validate,
};
pub use state::PreferenceState;
pub use store::{FileStore, KeyValueStore, MemoryStore};
