//! Pure field updates on a preference document.
//!
//! Each [`Edit`] takes a document by value and returns the updated one,
//! touching only the field it names.

use smol_str::SmolStr;
use std::fmt;
use std::str::FromStr;

use crate::schema::{Include, NotificationPreferences, PreferenceKey, PreferenceMut};

/// Delivery channel of a preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Push notification to the user's devices
    Push,
    /// Entry in the in-app notification list
    List,
}

impl Channel {
    /// Flag name in the wire format
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::List => "list",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(Self::Push),
            "list" => Ok(Self::List),
            other => Err(EditError::UnknownChannel(SmolStr::new(other))),
        }
    }
}

/// A single user edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Turn one delivery channel of one preference on or off
    SetChannel {
        /// Preference to change
        key: PreferenceKey,
        /// Channel to switch
        channel: Channel,
        /// New value
        enabled: bool,
    },
    /// Change the actor filter of a filterable preference
    SetInclude {
        /// Preference to change
        key: PreferenceKey,
        /// New filter
        include: Include,
    },
    /// Set `push` on every preference in [`PreferenceKey::OTHERS`]
    SetOthersPush(bool),
    /// Replace the document with the defaults
    Reset,
}

/// An edit that cannot apply to the document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum EditError {
    /// `SetInclude` on a preference without an `include` field
    #[error("`{0}` has no include filter")]
    #[diagnostic(
        code(skynotify::edit::not_filterable),
        help("only like, follow, reply, mention, quote, repost, likeViaRepost and repostViaRepost can be filtered")
    )]
    NotFilterable(PreferenceKey),

    /// Channel name other than `push` or `list`
    #[error("unknown channel `{0}`")]
    #[diagnostic(code(skynotify::edit::unknown_channel), help("expected `push` or `list`"))]
    UnknownChannel(SmolStr),
}

impl Edit {
    /// Apply this edit, returning the updated document.
    ///
    /// `SetInclude` accepts any [`Include`], including values the schema will
    /// reject; catching those is left to validation on save.
    pub fn apply(&self, mut doc: NotificationPreferences) -> Result<NotificationPreferences, EditError> {
        match self {
            Self::SetChannel {
                key,
                channel,
                enabled,
            } => {
                *channel_flag(doc.get_mut(*key), *channel) = *enabled;
            }
            Self::SetInclude { key, include } => match doc.get_mut(*key) {
                PreferenceMut::Filterable(pref) => pref.include = include.clone(),
                PreferenceMut::Plain(_) => return Err(EditError::NotFilterable(*key)),
            },
            Self::SetOthersPush(enabled) => {
                for key in PreferenceKey::OTHERS {
                    *channel_flag(doc.get_mut(key), Channel::Push) = *enabled;
                }
            }
            Self::Reset => doc = NotificationPreferences::default(),
        }
        Ok(doc)
    }
}

fn channel_flag(pref: PreferenceMut<'_>, channel: Channel) -> &mut bool {
    match (pref, channel) {
        (PreferenceMut::Filterable(p), Channel::Push) => &mut p.push,
        (PreferenceMut::Filterable(p), Channel::List) => &mut p.list,
        (PreferenceMut::Plain(p), Channel::Push) => &mut p.push,
        (PreferenceMut::Plain(p), Channel::List) => &mut p.list,
    }
}
