//! Loading and saving the preference document.
//!
//! Reads are lenient: anything wrong with the stored value is reported and
//! replaced by the defaults. Writes are strict: a document that fails
//! validation is never persisted.

use serde_json::Value;
use smol_str::SmolStr;

use crate::error::ConfigError;
use crate::notify::{NotificationKind, Notifier, messages};
use crate::schema::{NotificationPreferences, UnknownFields, validate_with};
use crate::store::KeyValueStore;

/// Storage key used when none is configured
pub const DEFAULT_KEY: &str = "config";

/// Options for a [`ConfigStore`].
///
/// ```
/// use skynotify_common::config::ConfigOptions;
/// use skynotify_common::schema::UnknownFields;
///
/// let opts = ConfigOptions::builder()
///     .key("prefs")
///     .unknown_fields(UnknownFields::Reject)
///     .build();
/// assert_eq!(opts.key, "prefs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct ConfigOptions {
    /// Key the document is stored under
    #[builder(into, default = SmolStr::new_static(DEFAULT_KEY))]
    pub key: SmolStr,
    /// Handling of fields the schema does not define
    #[builder(default)]
    pub unknown_fields: UnknownFields,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Bridges a [`NotificationPreferences`] document and a [`KeyValueStore`].
pub struct ConfigStore<S, N> {
    store: S,
    notifier: N,
    options: ConfigOptions,
}

impl<S, N> ConfigStore<S, N>
where
    S: KeyValueStore,
    N: Notifier,
{
    /// Store under the default key, stripping unknown fields
    pub fn new(store: S, notifier: N) -> Self {
        Self::with_options(store, notifier, ConfigOptions::default())
    }

    /// Store with explicit key and unknown-field handling
    pub fn with_options(store: S, notifier: N, options: ConfigOptions) -> Self {
        Self {
            store,
            notifier,
            options,
        }
    }

    /// Options this store was built with
    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    /// The backing key-value store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Where load and save outcomes are reported
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Load the stored document, falling back to defaults.
    ///
    /// Never fails. A missing value silently yields the defaults. An
    /// unreadable, unparsable or invalid value is reported through the
    /// notifier, removed from storage when possible, and replaced by the
    /// defaults. No partial merge is attempted.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self), fields(key = %self.options.key)))]
    pub fn load(&self) -> NotificationPreferences {
        match self.load_strict() {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("no stored preferences, using defaults");
                NotificationPreferences::default()
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "discarding stored preferences");
                self.notifier
                    .notify(NotificationKind::Error, messages::LOAD_DISCARDED);
                if !matches!(err, ConfigError::Store(_)) {
                    if let Err(_e) = self.store.del(&self.options.key) {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(error = %_e, "failed to remove corrupted preferences");
                    }
                }
                NotificationPreferences::default()
            }
        }
    }

    /// Load the stored document, surfacing corruption as an error.
    ///
    /// `Ok(None)` means nothing is stored. Nothing is reported through the
    /// notifier and storage is left untouched.
    pub fn load_strict(&self) -> Result<Option<NotificationPreferences>, ConfigError> {
        let Some(raw) = self.store.get(&self.options.key)? else {
            return Ok(None);
        };
        let value: Value = serde_json::from_str(&raw).map_err(ConfigError::Parse)?;
        let doc = validate_with(&value, self.options.unknown_fields)?;
        Ok(Some(doc))
    }

    /// Validate and persist `doc`.
    ///
    /// On success the compact JSON encoding is written and a success
    /// notification is sent. On failure nothing is written, an error
    /// notification is sent, and the error is logged and returned.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self, doc), fields(key = %self.options.key)))]
    pub fn save(&self, doc: &NotificationPreferences) -> Result<(), ConfigError> {
        match self.write(doc) {
            Ok(()) => {
                self.notifier.notify(NotificationKind::Success, messages::SAVE_OK);
                Ok(())
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %err, "refusing to save preferences");
                let message = match err {
                    ConfigError::Validation(_) | ConfigError::Encode(_) => messages::SAVE_INVALID,
                    ConfigError::Parse(_) | ConfigError::Store(_) => messages::SAVE_FAILED,
                };
                self.notifier.notify(NotificationKind::Error, message);
                Err(err)
            }
        }
    }

    fn write(&self, doc: &NotificationPreferences) -> Result<(), ConfigError> {
        let value = serde_json::to_value(doc).map_err(ConfigError::Encode)?;
        let validated = validate_with(&value, self.options.unknown_fields)?;
        let raw = serde_json::to_string(&validated).map_err(ConfigError::Encode)?;
        self.store.set(&self.options.key, raw)?;
        Ok(())
    }
}
