use piano_finder::model::settings::Settings;
use piano_finder::storage::settings::{load, open, save};

#[test]
fn roundtrip_settings_yaml() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("piano.yaml");

    let mut s = Settings::default();
    s.default_root = "F#3".parse().unwrap();
    s.list_limit = 5;
    s.muted = true;
    save(&s, &path).expect("save");

    let out = open(&path).expect("open");
    assert_eq!(out, s);
}

#[test]
fn partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("piano.yaml");
    std::fs::write(&path, "arpeggio_ms: 250\n").unwrap();

    let (s, source) = load(Some(&path)).expect("load");
    assert_eq!(s.arpeggio_ms, 250);
    assert_eq!(s.list_limit, 12);
    assert_eq!(source.as_deref(), Some(path.as_path()));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load(Some(&dir.path().join("nope.yaml"))).unwrap_err();
    assert!(format!("{:#}", err).contains("nope.yaml"));
}
