use std::path::PathBuf;
use twelveb_core::db::open_db_in_memory;
use twelveb_core::{
    load_config, AppConfig, AuthService, ConfigError, PageService, SqlitePageRepository,
    SqliteUserRepository, Theme, UserSettings,
};

#[test]
fn missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
fn config_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("twelveb.toml");
    std::fs::write(
        &path,
        "database_path = \"/var/lib/twelveb/data.db\"\nlog_dir = \"/var/log/twelveb\"\nlog_level = \"debug\"\n",
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.database_path, PathBuf::from("/var/lib/twelveb/data.db"));
    assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/twelveb")));
    assert_eq!(config.effective_log_level(), "debug");
}

#[test]
fn malformed_config_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "database_path = [").unwrap();

    let err = load_config(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
fn page_tree_serializes_nested_children() {
    let conn = open_db_in_memory().unwrap();
    let user = AuthService::new(SqliteUserRepository::try_new(&conn).unwrap())
        .register("alice", "pw", "Q?", "A")
        .unwrap();
    let pages = PageService::new(SqlitePageRepository::try_new(&conn).unwrap());
    let root = pages.create_page(user, "Projects", None).unwrap();
    let child = pages.create_page(user, "Garden", Some(root)).unwrap();

    let json = serde_json::to_value(pages.page_tree(user).unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "id": root,
            "title": "Projects",
            "children": [{ "id": child, "title": "Garden", "children": [] }]
        }])
    );
}

#[test]
fn settings_serialize_theme_in_snake_case() {
    let settings = UserSettings {
        dark_mode: true,
        font_size: 18,
        theme: Theme::Light,
    };
    let json = serde_json::to_value(settings).unwrap();
    assert_eq!(json["theme"], "light");

    let parsed: UserSettings =
        serde_json::from_str(r#"{"dark_mode":false,"font_size":12,"theme":"dark"}"#).unwrap();
    assert_eq!(parsed.theme, Theme::Dark);
}
