//! Remote collaborators: the notification preference and profile endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use skynotify_common::NotificationPreferences;
use smol_str::SmolStr;
use std::future::Future;
use url::Url;

use crate::auth::Session;
use crate::error::ApiResult;
use crate::http_client::HttpClient;
use crate::xrpc::{self, CallOptions, XrpcMethod, XrpcRequest};

/// `app.bsky.notification.putPreferencesV2`.
///
/// The body is the preference document exactly as it is stored locally.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct PutPreferencesV2<'a>(pub &'a NotificationPreferences);

/// Server's view of the preferences after the update.
///
/// Kept untyped: the server returns preferences (e.g. `chat`) that are not
/// part of the local document.
#[derive(Debug, Clone, Deserialize)]
pub struct PutPreferencesV2Output {
    /// Full preference set as stored server-side
    pub preferences: Value,
}

impl XrpcRequest for PutPreferencesV2<'_> {
    const NSID: &'static str = "app.bsky.notification.putPreferencesV2";
    const METHOD: XrpcMethod = XrpcMethod::Procedure("application/json");
    type Output = PutPreferencesV2Output;
}

/// `app.bsky.actor.getProfile`
#[derive(Debug, Clone, Serialize)]
pub struct GetProfile {
    /// Handle or DID
    pub actor: SmolStr,
}

/// The parts of a profile the page header shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Account DID
    pub did: SmolStr,
    /// Current handle
    pub handle: SmolStr,
    /// Display name, if set
    #[serde(default)]
    pub display_name: Option<SmolStr>,
    /// Avatar image URL
    #[serde(default)]
    pub avatar: Option<SmolStr>,
}

impl Profile {
    /// Display name, falling back to the handle
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.handle.as_str())
    }
}

impl XrpcRequest for GetProfile {
    const NSID: &'static str = "app.bsky.actor.getProfile";
    const METHOD: XrpcMethod = XrpcMethod::Query;
    type Output = Profile;
}

/// Pushes a preference document upstream.
#[trait_variant::make(Send)]
pub trait PreferencesApi {
    /// Replace the account's notification preferences with `prefs`
    fn put_preferences(
        &self,
        session: &Session,
        prefs: &NotificationPreferences,
    ) -> impl Future<Output = ApiResult<()>>;
}

/// Reads public profiles.
#[trait_variant::make(Send)]
pub trait ProfileApi {
    /// Fetch `actor` (handle or DID) from `endpoint`.
    ///
    /// With a session the call carries its access token; without one it is
    /// an unauthenticated read, e.g. against the public AppView.
    fn get_profile(
        &self,
        endpoint: &Url,
        actor: &str,
        session: Option<&Session>,
    ) -> impl Future<Output = ApiResult<Profile>>;
}

/// [`PreferencesApi`] and [`ProfileApi`] over XRPC, sent to the session's PDS.
#[derive(Debug, Clone)]
pub struct XrpcApi<C> {
    client: C,
    proxy: Option<SmolStr>,
}

impl<C: HttpClient + Sync> XrpcApi<C> {
    /// Calls go straight to the session's PDS
    pub fn new(client: C) -> Self {
        Self {
            client,
            proxy: None,
        }
    }

    /// Route calls through the PDS to a specific service,
    /// e.g. `did:web:api.bsky.app#bsky_appview`
    pub fn with_proxy(mut self, proxy: impl Into<SmolStr>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    fn options(&self, session: &Session) -> CallOptions {
        CallOptions {
            auth: Some(session.access_jwt.clone()),
            atproto_proxy: self.proxy.clone(),
            ..Default::default()
        }
    }
}

impl<C: HttpClient + Sync> PreferencesApi for XrpcApi<C> {
    async fn put_preferences(
        &self,
        session: &Session,
        prefs: &NotificationPreferences,
    ) -> ApiResult<()> {
        let output = xrpc::send(
            &self.client,
            &session.pds,
            &PutPreferencesV2(prefs),
            &self.options(session),
        )
        .await?;
        tracing::debug!(preferences = %output.preferences, "server accepted preferences");
        Ok(())
    }
}

impl<C: HttpClient + Sync> ProfileApi for XrpcApi<C> {
    async fn get_profile(
        &self,
        endpoint: &Url,
        actor: &str,
        session: Option<&Session>,
    ) -> ApiResult<Profile> {
        let request = GetProfile {
            actor: SmolStr::new(actor),
        };
        let opts = session.map(|s| self.options(s)).unwrap_or_default();
        xrpc::send(&self.client, endpoint, &request, &opts).await
    }
}
