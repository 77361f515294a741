//! The single owned copy of the document being edited.

use crate::config::ConfigStore;
use crate::edit::{Edit, EditError};
use crate::error::ConfigError;
use crate::notify::Notifier;
use crate::schema::NotificationPreferences;
use crate::store::KeyValueStore;

/// Current document plus whether it differs from what was last loaded or saved.
///
/// Renderers read [`current`](Self::current); edits go through
/// [`edit`](Self::edit) so every change is a pure [`Edit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceState {
    current: NotificationPreferences,
    dirty: bool,
}

impl PreferenceState {
    /// Clean state holding `doc`
    pub fn new(doc: NotificationPreferences) -> Self {
        Self {
            current: doc,
            dirty: false,
        }
    }

    /// Start from whatever the store holds (defaults on corruption)
    pub fn load<S: KeyValueStore, N: Notifier>(config: &ConfigStore<S, N>) -> Self {
        Self::new(config.load())
    }

    /// The document as edited so far
    pub fn current(&self) -> &NotificationPreferences {
        &self.current
    }

    /// Whether there are unsaved edits
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Apply one edit. The state is unchanged if the edit fails.
    pub fn edit(&mut self, edit: &Edit) -> Result<(), EditError> {
        let next = edit.apply(self.current.clone())?;
        if next != self.current {
            self.current = next;
            self.dirty = true;
        }
        Ok(())
    }

    /// Persist the current document. Stays dirty if the save is rejected.
    pub fn save<S: KeyValueStore, N: Notifier>(
        &mut self,
        config: &ConfigStore<S, N>,
    ) -> Result<(), ConfigError> {
        config.save(&self.current)?;
        self.dirty = false;
        Ok(())
    }

    /// Take the document out
    pub fn into_inner(self) -> NotificationPreferences {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::Channel;
    use crate::schema::{Include, PreferenceKey};
    use crate::store::MemoryStore;

    #[test]
    fn edits_mark_dirty_and_save_clears() {
        let config = ConfigStore::new(MemoryStore::new(), ());
        let mut state = PreferenceState::load(&config);
        assert!(!state.is_dirty());

        state
            .edit(&Edit::SetChannel {
                key: PreferenceKey::Mention,
                channel: Channel::List,
                enabled: false,
            })
            .unwrap();
        assert!(state.is_dirty());
        assert!(!state.current().mention.list);

        state.save(&config).unwrap();
        assert!(!state.is_dirty());
        assert_eq!(config.load(), *state.current());
    }

    #[test]
    fn no_op_edit_stays_clean() {
        let mut state = PreferenceState::default();
        state.edit(&Edit::SetOthersPush(true)).unwrap();
        assert!(!state.is_dirty());
    }

    #[test]
    fn failed_edit_leaves_state_alone() {
        let mut state = PreferenceState::default();
        let err = state.edit(&Edit::SetInclude {
            key: PreferenceKey::SubscribedPost,
            include: Include::Follows,
        });
        assert!(err.is_err());
        assert_eq!(state, PreferenceState::default());
    }

    #[test]
    fn rejected_save_stays_dirty() {
        let config = ConfigStore::new(MemoryStore::new(), ());
        let mut state = PreferenceState::default();
        state
            .edit(&Edit::SetInclude {
                key: PreferenceKey::Like,
                include: Include::from("nobody"),
            })
            .unwrap();
        assert!(state.save(&config).is_err());
        assert!(state.is_dirty());
        assert!(config.load_strict().unwrap().is_none());
    }
}
