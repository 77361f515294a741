//! The notification preference document and its validation.
//!
//! Field names and `include` values are the wire format shared by local
//! storage and `app.bsky.notification.putPreferencesV2`; renaming any of them
//! breaks previously stored documents.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use smol_str::SmolStr;
use std::fmt;
use std::str::FromStr;

use crate::error::{FieldPath, Issue, IssueKind, ValidationError};

/// Which actors a filterable notification is delivered for.
///
/// The schema only admits `all` and `follows`. Any other string is kept as
/// [`Include::Other`] so that a bad edit survives until validation rejects it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Include {
    /// Notifications from everyone
    #[default]
    All,
    /// Notifications only from accounts the user follows
    Follows,
    /// Not a schema value
    Other(SmolStr),
}

impl Include {
    /// Accepted wire values
    pub const ALLOWED: &'static [&'static str] = &["all", "follows"];

    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Follows => "follows",
            Self::Other(other) => other.as_str(),
        }
    }

    /// Whether this is one of the schema values
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for Include {
    /// Exact match only: no trimming or case folding.
    fn from(value: &str) -> Self {
        match value {
            "all" => Self::All,
            "follows" => Self::Follows,
            other => Self::Other(SmolStr::new(other)),
        }
    }
}

impl From<String> for Include {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl FromStr for Include {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for Include {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Include {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Delivery flags plus an actor filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterablePreference {
    /// Whose activity triggers the notification
    pub include: Include,
    /// Show in the in-app notification list
    pub list: bool,
    /// Send a push notification
    pub push: bool,
}

impl FilterablePreference {
    /// Wire field names
    pub const FIELDS: &'static [&'static str] = &["include", "list", "push"];
}

impl Default for FilterablePreference {
    fn default() -> Self {
        Self {
            include: Include::All,
            list: true,
            push: true,
        }
    }
}

/// Delivery flags for the in-app list and push.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    /// Show in the in-app notification list
    pub list: bool,
    /// Send a push notification
    pub push: bool,
}

impl Preference {
    /// Wire field names
    pub const FIELDS: &'static [&'static str] = &["list", "push"];
}

impl Default for Preference {
    fn default() -> Self {
        Self {
            list: true,
            push: true,
        }
    }
}

/// The full set of notification preferences for the signed-in user.
///
/// Serialization follows field declaration order, so the same document always
/// encodes to the same bytes. Deserialization goes through [`validate`], so a
/// document read with serde is held to the same schema as a stored one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "Value")]
pub struct NotificationPreferences {
    /// Someone liked your post
    pub like: FilterablePreference,
    /// Someone followed you
    pub follow: FilterablePreference,
    /// Someone replied to your post
    pub reply: FilterablePreference,
    /// Someone mentioned you
    pub mention: FilterablePreference,
    /// Someone quoted your post
    pub quote: FilterablePreference,
    /// Someone reposted your post
    pub repost: FilterablePreference,
    /// An account you subscribed to posted
    pub subscribed_post: Preference,
    /// Someone liked your repost
    pub like_via_repost: FilterablePreference,
    /// Someone reposted your repost
    pub repost_via_repost: FilterablePreference,
    /// Someone joined through your starter pack
    pub starterpack_joined: Preference,
    /// You lost verification
    pub unverified: Preference,
    /// You were verified
    pub verified: Preference,
}

/// Identifies one of the twelve preferences in a [`NotificationPreferences`].
///
/// Variants mirror the document fields one to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PreferenceKey {
    /// `like`
    Like,
    /// `follow`
    Follow,
    /// `reply`
    Reply,
    /// `mention`
    Mention,
    /// `quote`
    Quote,
    /// `repost`
    Repost,
    /// `subscribedPost`
    SubscribedPost,
    /// `likeViaRepost`
    LikeViaRepost,
    /// `repostViaRepost`
    RepostViaRepost,
    /// `starterpackJoined`
    StarterpackJoined,
    /// `unverified`
    Unverified,
    /// `verified`
    Verified,
}

impl PreferenceKey {
    /// Every key, in wire order
    pub const ALL: [PreferenceKey; 12] = [
        Self::Like,
        Self::Follow,
        Self::Reply,
        Self::Mention,
        Self::Quote,
        Self::Repost,
        Self::SubscribedPost,
        Self::LikeViaRepost,
        Self::RepostViaRepost,
        Self::StarterpackJoined,
        Self::Unverified,
        Self::Verified,
    ];

    /// The "everything else" group that shares a single push toggle
    pub const OTHERS: [PreferenceKey; 3] =
        [Self::StarterpackJoined, Self::Unverified, Self::Verified];

    /// Wire field name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Follow => "follow",
            Self::Reply => "reply",
            Self::Mention => "mention",
            Self::Quote => "quote",
            Self::Repost => "repost",
            Self::SubscribedPost => "subscribedPost",
            Self::LikeViaRepost => "likeViaRepost",
            Self::RepostViaRepost => "repostViaRepost",
            Self::StarterpackJoined => "starterpackJoined",
            Self::Unverified => "unverified",
            Self::Verified => "verified",
        }
    }

    /// Whether this preference carries an `include` filter
    pub const fn is_filterable(self) -> bool {
        !matches!(
            self,
            Self::SubscribedPost | Self::StarterpackJoined | Self::Unverified | Self::Verified
        )
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string that names no preference
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
#[error("unknown preference `{0}`")]
#[diagnostic(
    code(skynotify::schema::unknown_key),
    help("expected one of: like, follow, reply, mention, quote, repost, subscribedPost, likeViaRepost, repostViaRepost, starterpackJoined, unverified, verified")
)]
pub struct UnknownPreferenceKey(pub SmolStr);

impl FromStr for PreferenceKey {
    type Err = UnknownPreferenceKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownPreferenceKey(SmolStr::new(s)))
    }
}

/// Borrowed view of one preference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceRef<'a> {
    /// Preference with an `include` filter
    Filterable(&'a FilterablePreference),
    /// Preference with delivery flags only
    Plain(&'a Preference),
}

impl PreferenceRef<'_> {
    /// In-app list flag
    pub fn list(&self) -> bool {
        match self {
            Self::Filterable(p) => p.list,
            Self::Plain(p) => p.list,
        }
    }

    /// Push flag
    pub fn push(&self) -> bool {
        match self {
            Self::Filterable(p) => p.push,
            Self::Plain(p) => p.push,
        }
    }

    /// `None` for preferences without a filter
    pub fn include(&self) -> Option<&Include> {
        match self {
            Self::Filterable(p) => Some(&p.include),
            Self::Plain(_) => None,
        }
    }
}

/// Mutable view of one preference
#[derive(Debug, PartialEq, Eq)]
pub enum PreferenceMut<'a> {
    /// Preference with an `include` filter
    Filterable(&'a mut FilterablePreference),
    /// Preference with delivery flags only
    Plain(&'a mut Preference),
}

impl NotificationPreferences {
    /// Look up a preference by key
    pub fn get(&self, key: PreferenceKey) -> PreferenceRef<'_> {
        use PreferenceKey::*;
        match key {
            Like => PreferenceRef::Filterable(&self.like),
            Follow => PreferenceRef::Filterable(&self.follow),
            Reply => PreferenceRef::Filterable(&self.reply),
            Mention => PreferenceRef::Filterable(&self.mention),
            Quote => PreferenceRef::Filterable(&self.quote),
            Repost => PreferenceRef::Filterable(&self.repost),
            SubscribedPost => PreferenceRef::Plain(&self.subscribed_post),
            LikeViaRepost => PreferenceRef::Filterable(&self.like_via_repost),
            RepostViaRepost => PreferenceRef::Filterable(&self.repost_via_repost),
            StarterpackJoined => PreferenceRef::Plain(&self.starterpack_joined),
            Unverified => PreferenceRef::Plain(&self.unverified),
            Verified => PreferenceRef::Plain(&self.verified),
        }
    }

    /// Look up a preference by key for modification
    pub fn get_mut(&mut self, key: PreferenceKey) -> PreferenceMut<'_> {
        use PreferenceKey::*;
        match key {
            Like => PreferenceMut::Filterable(&mut self.like),
            Follow => PreferenceMut::Filterable(&mut self.follow),
            Reply => PreferenceMut::Filterable(&mut self.reply),
            Mention => PreferenceMut::Filterable(&mut self.mention),
            Quote => PreferenceMut::Filterable(&mut self.quote),
            Repost => PreferenceMut::Filterable(&mut self.repost),
            SubscribedPost => PreferenceMut::Plain(&mut self.subscribed_post),
            LikeViaRepost => PreferenceMut::Filterable(&mut self.like_via_repost),
            RepostViaRepost => PreferenceMut::Filterable(&mut self.repost_via_repost),
            StarterpackJoined => PreferenceMut::Plain(&mut self.starterpack_joined),
            Unverified => PreferenceMut::Plain(&mut self.unverified),
            Verified => PreferenceMut::Plain(&mut self.verified),
        }
    }

    /// Re-check an in-memory document against the schema.
    ///
    /// Goes through the same JSON validation as a stored document, so an edit
    /// that produced an out-of-range `include` is caught here.
    pub fn validate(&self) -> Result<Self, ValidationError> {
        let value = serde_json::to_value(self).map_err(|e| {
            ValidationError::new(vec![Issue::new(
                FieldPath::root(),
                IssueKind::Unencodable(smol_str::format_smolstr!("{e}")),
            )])
        })?;
        validate_with(&value, UnknownFields::Reject)
    }
}

impl TryFrom<Value> for NotificationPreferences {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        validate(&value)
    }
}

/// What to do with fields the schema does not define
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UnknownFields {
    /// Drop them from the validated document
    #[default]
    Strip,
    /// Treat them as validation issues
    Reject,
}

/// Validate an untyped JSON value as a preference document, stripping unknown fields.
pub fn validate(candidate: &Value) -> Result<NotificationPreferences, ValidationError> {
    validate_with(candidate, UnknownFields::Strip)
}

/// Validate an untyped JSON value as a preference document.
///
/// Every field must be present with the correct type. All issues are
/// collected before returning.
pub fn validate_with(
    candidate: &Value,
    unknown: UnknownFields,
) -> Result<NotificationPreferences, ValidationError> {
    let mut checker = Checker {
        unknown,
        issues: Vec::new(),
    };
    let root = FieldPath::root();
    let Some(map) = checker.object(candidate, &root) else {
        return Err(ValidationError::new(checker.issues));
    };
    let known: Vec<&str> = PreferenceKey::ALL.iter().map(|k| k.as_str()).collect();
    checker.unknown_keys(map, &root, &known);

    use PreferenceKey::*;
    let doc = NotificationPreferences {
        like: checker.filterable(map, Like),
        follow: checker.filterable(map, Follow),
        reply: checker.filterable(map, Reply),
        mention: checker.filterable(map, Mention),
        quote: checker.filterable(map, Quote),
        repost: checker.filterable(map, Repost),
        subscribed_post: checker.plain(map, SubscribedPost),
        like_via_repost: checker.filterable(map, LikeViaRepost),
        repost_via_repost: checker.filterable(map, RepostViaRepost),
        starterpack_joined: checker.plain(map, StarterpackJoined),
        unverified: checker.plain(map, Unverified),
        verified: checker.plain(map, Verified),
    };

    if checker.issues.is_empty() {
        Ok(doc)
    } else {
        Err(ValidationError::new(checker.issues))
    }
}

// Field readers record an issue and fall back to a placeholder so the walk can
// continue; the placeholder never escapes because any issue fails validation.
struct Checker {
    unknown: UnknownFields,
    issues: Vec<Issue>,
}

impl Checker {
    fn issue(&mut self, path: FieldPath, kind: IssueKind) {
        self.issues.push(Issue::new(path, kind));
    }

    fn object<'v>(&mut self, value: &'v Value, path: &FieldPath) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.issue(
                    path.clone(),
                    IssueKind::WrongType {
                        expected: "object",
                        found: json_type(other),
                    },
                );
                None
            }
        }
    }

    fn field<'v>(
        &mut self,
        map: &'v Map<String, Value>,
        path: &FieldPath,
        name: &str,
    ) -> Option<(&'v Value, FieldPath)> {
        let child = path.child(name);
        match map.get(name) {
            Some(value) => Some((value, child)),
            None => {
                self.issue(child, IssueKind::Missing);
                None
            }
        }
    }

    fn unknown_keys(&mut self, map: &Map<String, Value>, path: &FieldPath, known: &[&str]) {
        if self.unknown == UnknownFields::Strip {
            return;
        }
        for key in map.keys() {
            if !known.contains(&key.as_str()) {
                self.issue(path.child(key.as_str()), IssueKind::UnknownField);
            }
        }
    }

    fn boolean(&mut self, map: &Map<String, Value>, path: &FieldPath, name: &str) -> bool {
        let Some((value, path)) = self.field(map, path, name) else {
            return false;
        };
        match value {
            Value::Bool(b) => *b,
            other => {
                self.issue(
                    path,
                    IssueKind::WrongType {
                        expected: "boolean",
                        found: json_type(other),
                    },
                );
                false
            }
        }
    }

    fn include(&mut self, map: &Map<String, Value>, path: &FieldPath) -> Include {
        let Some((value, path)) = self.field(map, path, "include") else {
            return Include::All;
        };
        match value {
            Value::String(s) => match Include::from(s.as_str()) {
                Include::Other(value) => {
                    self.issue(
                        path,
                        IssueKind::InvalidEnum {
                            value,
                            allowed: Include::ALLOWED,
                        },
                    );
                    Include::All
                }
                known => known,
            },
            other => {
                self.issue(
                    path,
                    IssueKind::WrongType {
                        expected: "string",
                        found: json_type(other),
                    },
                );
                Include::All
            }
        }
    }

    fn filterable(&mut self, map: &Map<String, Value>, key: PreferenceKey) -> FilterablePreference {
        let Some((value, path)) = self.field(map, &FieldPath::root(), key.as_str()) else {
            return FilterablePreference::default();
        };
        let Some(inner) = self.object(value, &path) else {
            return FilterablePreference::default();
        };
        self.unknown_keys(inner, &path, FilterablePreference::FIELDS);
        FilterablePreference {
            include: self.include(inner, &path),
            list: self.boolean(inner, &path, "list"),
            push: self.boolean(inner, &path, "push"),
        }
    }

    fn plain(&mut self, map: &Map<String, Value>, key: PreferenceKey) -> Preference {
        let Some((value, path)) = self.field(map, &FieldPath::root(), key.as_str()) else {
            return Preference::default();
        };
        let Some(inner) = self.object(value, &path) else {
            return Preference::default();
        };
        self.unknown_keys(inner, &path, Preference::FIELDS);
        Preference {
            list: self.boolean(inner, &path, "list"),
            push: self.boolean(inner, &path, "push"),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
