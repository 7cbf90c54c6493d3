use pixel_macro::flags::Flag;
use pixel_macro::settings::{Settings, SkillMode, WatchCondition, WatchConfig};
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let settings = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.skill_mode, SkillMode::Normal);
    assert_eq!(settings.window_title, "Roblox");
    assert_eq!(settings.session_poll_ms, 500);
    assert_eq!(settings.gameplay_poll_ms, 12);
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let mut settings = Settings::default();
    settings.skill_mode = SkillMode::Stealblock;
    settings.debug_logging = true;
    settings.watchers[0].tolerance = 3;
    settings.save(path.to_str().unwrap()).unwrap();

    let loaded = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn partial_file_fills_in_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{ "skill_mode": "boomjump" }"#).unwrap();

    let settings = Settings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(settings.skill_mode, SkillMode::Boomjump);
    assert_eq!(settings.window_title, "Roblox");
    assert_eq!(settings.watchers.len(), 3);
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "not json").unwrap();
    assert!(Settings::load(path.to_str().unwrap()).is_err());
}

#[test]
fn skill_mode_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&SkillMode::Boomjump).unwrap(),
        "\"boomjump\""
    );
    assert_eq!(
        serde_json::from_str::<SkillMode>("\"stealblock\"").unwrap(),
        SkillMode::Stealblock
    );
}

#[test]
fn default_watch_table_resolves_fully() {
    let resolved = Settings::default().resolve_watchers();
    assert_eq!(resolved.len(), 3);
    assert_eq!(resolved[0].flag, Flag::OnGround);
    assert_eq!(resolved[0].point, (942, 1003));
    assert_eq!(resolved[1].flag, Flag::ShiftLock);
    assert_eq!(resolved[2].flag, Flag::SkillReady);
}

#[test]
fn unknown_and_non_gameplay_watchers_are_skipped() {
    let mut settings = Settings::default();
    settings.watchers.push(WatchConfig {
        flag: "no_such_flag".into(),
        point: (0, 0),
        target: (0, 0, 0),
        tolerance: 0,
        conditions: Vec::new(),
    });
    settings.watchers.push(WatchConfig {
        flag: Flag::Active.name().into(),
        point: (0, 0),
        target: (0, 0, 0),
        tolerance: 0,
        conditions: Vec::new(),
    });
    assert_eq!(settings.resolve_watchers().len(), 3);
}

#[test]
fn watcher_with_unknown_condition_flag_is_skipped_whole() {
    let mut settings = Settings::default();
    settings.watchers[2].conditions.push(WatchCondition {
        flag: "bogus".into(),
        value: true,
    });
    let resolved = settings.resolve_watchers();
    assert_eq!(resolved.len(), 2);
    assert!(resolved.iter().all(|w| w.flag != Flag::SkillReady));
}

#[test]
fn conditions_resolve_to_flag_value_pairs() {
    let mut settings = Settings::default();
    settings.watchers[2].conditions.push(WatchCondition {
        flag: Flag::OnGround.name().into(),
        value: true,
    });
    let resolved = settings.resolve_watchers();
    assert_eq!(resolved[2].conditions, vec![(Flag::OnGround, true)]);
}
