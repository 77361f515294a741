//! Sending the in-memory document to the remote preferences API.

use miette::Diagnostic;
use skynotify_common::{NotificationKind, NotificationPreferences, Notifier, ValidationError};
use smol_str::SmolStr;
use tokio::sync::Mutex;

use crate::api::{PreferencesApi, Profile, ProfileApi};
use crate::auth::AuthProvider;
use crate::error::ApiError;

/// Messages shown for apply and profile outcomes.
pub mod messages {
    /// Info, before the remote call
    pub const APPLYING: &str = "Applying notification preferences";
    /// Success
    pub const APPLIED: &str = "Notification preferences applied";
    /// Error, remote call failed
    pub const APPLY_FAILED: &str = "Failed to apply notification preferences";
    /// Error, document failed validation
    pub const APPLY_INVALID: &str = "Configuration is corrupted and was not applied";
    /// Info, overlapping apply dropped
    pub const APPLY_BUSY: &str = "Preferences are already being applied";
    /// Error, no session
    pub const NOT_SIGNED_IN: &str = "Sign in before applying preferences";
    /// Error, profile lookup failed
    pub const PROFILE_FAILED: &str = "Failed to load profile";
}

/// Why an apply or profile lookup did not happen
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ApplyError {
    /// Another apply was running; this one was dropped
    #[error("an apply is already in progress")]
    #[diagnostic(code(skynotify::apply::in_flight))]
    InFlight,

    /// No session, and nothing to act on without one
    #[error("not signed in")]
    #[diagnostic(
        code(skynotify::apply::not_signed_in),
        help("pass --pds, --did and --access-jwt (or the SKYNOTIFY_* environment variables)")
    )]
    NotSignedIn,

    /// The document failed validation and was not sent
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    /// The remote call failed
    #[error("remote call failed: {0}")]
    #[diagnostic(code(skynotify::apply::remote))]
    Api(
        #[from]
        #[diagnostic_source]
        ApiError,
    ),
}

/// Applies documents upstream, at most one at a time.
///
/// Overlapping calls are dropped with [`ApplyError::InFlight`] rather than
/// queued.
pub struct Applier<A, P, N> {
    auth: A,
    api: P,
    notifier: N,
    in_flight: Mutex<()>,
}

impl<A, P, N> Applier<A, P, N>
where
    A: AuthProvider,
    N: Notifier,
{
    /// An idle applier
    pub fn new(auth: A, api: P, notifier: N) -> Self {
        Self {
            auth,
            api,
            notifier,
            in_flight: Mutex::new(()),
        }
    }

    /// The session source
    pub fn auth(&self) -> &A {
        &self.auth
    }

    /// Whether an apply is currently in flight
    pub fn is_applying(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }
}

impl<A, P, N> Applier<A, P, N>
where
    A: AuthProvider,
    P: PreferencesApi + Sync,
    N: Notifier,
{
    /// Validate `doc` and send it to the remote preferences API.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn apply(&self, doc: &NotificationPreferences) -> Result<(), ApplyError> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::info!("apply already in flight, dropping request");
            self.notifier.notify(NotificationKind::Info, messages::APPLY_BUSY);
            return Err(ApplyError::InFlight);
        };

        let Some(session) = self.auth.session() else {
            self.notifier
                .notify(NotificationKind::Error, messages::NOT_SIGNED_IN);
            return Err(ApplyError::NotSignedIn);
        };

        let doc = match doc.validate() {
            Ok(doc) => doc,
            Err(err) => {
                tracing::error!(error = %err, "refusing to apply invalid preferences");
                self.notifier
                    .notify(NotificationKind::Error, messages::APPLY_INVALID);
                return Err(err.into());
            }
        };

        self.notifier.notify(NotificationKind::Info, messages::APPLYING);
        match self.api.put_preferences(&session, &doc).await {
            Ok(()) => {
                tracing::info!(did = %session.did, "preferences applied");
                self.notifier.notify(NotificationKind::Success, messages::APPLIED);
                Ok(())
            }
            Err(err) => {
                tracing::error!(did = %session.did, error = %err, "apply failed");
                self.notifier
                    .notify(NotificationKind::Error, messages::APPLY_FAILED);
                Err(err.into())
            }
        }
    }
}

impl<A, P, N> Applier<A, P, N>
where
    A: AuthProvider,
    P: ProfileApi + Sync,
    N: Notifier,
{
    /// Display name and avatar of `actor`, or of the signed-in account.
    ///
    /// Signed out, `actor` is looked up on the public AppView and
    /// [`ApplyError::NotSignedIn`] is returned only when there is no actor.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn profile(&self, actor: Option<&str>) -> Result<Profile, ApplyError> {
        let session = self.auth.session();
        let actor = match (actor, &session) {
            (Some(actor), _) => SmolStr::new(actor),
            (None, Some(session)) => session.did.clone(),
            (None, None) => return Err(ApplyError::NotSignedIn),
        };
        let endpoint = self.auth.endpoint();
        let result = self
            .api
            .get_profile(&endpoint, &actor, session.as_ref())
            .await;
        result.map_err(|err| {
            tracing::warn!(error = %err, "profile fetch failed");
            self.notifier
                .notify(NotificationKind::Error, messages::PROFILE_FAILED);
            err.into()
        })
    }
}
