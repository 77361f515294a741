//! Who, if anyone, is signed in.
//!
//! Obtaining a session (OAuth, app passwords) happens elsewhere; this module
//! only carries the result to the remote calls.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use std::sync::LazyLock;
use url::Url;

/// Public Bluesky AppView, used for unauthenticated reads.
pub const PUBLIC_APPVIEW: &str = "https://public.api.bsky.app";

/// [`PUBLIC_APPVIEW`], parsed
pub static PUBLIC_APPVIEW_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse(PUBLIC_APPVIEW).expect("public appview url is valid"));

/// A signed-in account and the credentials to act as it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Account DID
    pub did: SmolStr,
    /// Handle, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<SmolStr>,
    /// Bearer token for the PDS
    pub access_jwt: SmolStr,
    /// The account's PDS
    pub pds: Url,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("did", &self.did)
            .field("handle", &self.handle)
            .field("access_jwt", &"<redacted>")
            .field("pds", &self.pds.as_str())
            .finish()
    }
}

/// Supplies the current session, if any.
pub trait AuthProvider: Send + Sync {
    /// The current session, if signed in
    fn session(&self) -> Option<Session>;

    /// Whether a session is available
    fn is_signed_in(&self) -> bool {
        self.session().is_some()
    }

    /// Where requests should go: the PDS when signed in, the public AppView otherwise
    fn endpoint(&self) -> Url {
        self.session()
            .map(|s| s.pds)
            .unwrap_or_else(|| PUBLIC_APPVIEW_URL.clone())
    }
}

impl<T: AuthProvider + ?Sized> AuthProvider for std::sync::Arc<T> {
    fn session(&self) -> Option<Session> {
        self.as_ref().session()
    }
}

/// A fixed session, or none.
#[derive(Clone, Debug, Default)]
pub struct StaticAuth(Option<Session>);

impl StaticAuth {
    /// Always signed in as `session`
    pub fn signed_in(session: Session) -> Self {
        Self(Some(session))
    }

    /// Never signed in
    pub fn signed_out() -> Self {
        Self(None)
    }
}

impl From<Option<Session>> for StaticAuth {
    fn from(value: Option<Session>) -> Self {
        Self(value)
    }
}

impl AuthProvider for StaticAuth {
    fn session(&self) -> Option<Session> {
        self.0.clone()
    }
}
