use skynotify_common::edit::{Channel, Edit};
use skynotify_common::notify::{RecordingNotifier, messages};
use skynotify_common::schema::UnknownFields;
use skynotify_common::{
    ConfigError, ConfigOptions, ConfigStore, FileStore, Include, KeyValueStore, NotificationKind,
    NotificationPreferences, PreferenceKey, PreferenceState,
};

fn file_config(dir: &tempfile::TempDir) -> (ConfigStore<FileStore, RecordingNotifier>, RecordingNotifier) {
    let notes = RecordingNotifier::new();
    let store = FileStore::new(dir.path().join("prefs").join("skynotify.json"));
    (ConfigStore::new(store, notes.clone()), notes)
}

#[test]
fn saved_document_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let (config, notes) = file_config(&dir);

    let mut state = PreferenceState::load(&config);
    state
        .edit(&Edit::SetInclude {
            key: PreferenceKey::Follow,
            include: Include::Follows,
        })
        .unwrap();
    state
        .edit(&Edit::SetChannel {
            key: PreferenceKey::Unverified,
            channel: Channel::List,
            enabled: false,
        })
        .unwrap();
    state.save(&config).unwrap();
    assert!(!state.is_dirty());
    assert_eq!(
        notes.take(),
        vec![(NotificationKind::Success, messages::SAVE_OK.to_string())]
    );

    let (reopened, reopened_notes) = file_config(&dir);
    let doc = reopened.load();
    assert_eq!(&doc, state.current());
    assert_eq!(doc.follow.include, Include::Follows);
    assert!(!doc.unverified.list);
    assert!(reopened_notes.entries().is_empty());
}

#[test]
fn partial_document_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let (config, notes) = file_config(&dir);
    config
        .store()
        .set(
            "config",
            r#"{"like":{"include":"all","list":true,"push":true}}"#.into(),
        )
        .unwrap();

    assert_eq!(config.load(), NotificationPreferences::default());
    assert_eq!(
        notes.entries(),
        vec![(NotificationKind::Error, messages::LOAD_DISCARDED.to_string())]
    );
    assert_eq!(config.store().get("config").unwrap(), None);
}

#[test]
fn strict_load_reports_every_problem_and_keeps_the_value() {
    let dir = tempfile::tempdir().unwrap();
    let (config, notes) = file_config(&dir);
    let mut raw = serde_json::to_value(NotificationPreferences::default()).unwrap();
    raw["quote"]["include"] = "nobody".into();
    raw["verified"]["push"] = "yes".into();
    config.store().set("config", raw.to_string()).unwrap();

    match config.load_strict() {
        Err(ConfigError::Validation(err)) => {
            assert!(err.has_issue_at("quote.include"));
            assert!(err.has_issue_at("verified.push"));
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert!(notes.entries().is_empty());
    assert!(config.store().get("config").unwrap().is_some());
}

#[test]
fn reject_mode_treats_unknown_fields_as_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("skynotify.json"));
    let mut raw = serde_json::to_value(NotificationPreferences::default()).unwrap();
    raw["chat"] = serde_json::json!({ "include": "all", "push": true });
    store.set("prefs", raw.to_string()).unwrap();

    let lenient = ConfigStore::with_options(
        store.clone(),
        (),
        ConfigOptions::builder().key("prefs").build(),
    );
    assert_eq!(
        lenient.load_strict().unwrap(),
        Some(NotificationPreferences::default())
    );

    let strict = ConfigStore::with_options(
        store,
        (),
        ConfigOptions::builder()
            .key("prefs")
            .unknown_fields(UnknownFields::Reject)
            .build(),
    );
    match strict.load_strict() {
        Err(ConfigError::Validation(err)) => assert!(err.has_issue_at("chat")),
        other => panic!("unexpected result {other:?}"),
    }
}
