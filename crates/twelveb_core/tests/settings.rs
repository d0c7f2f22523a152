use rusqlite::Connection;
use twelveb_core::db::open_db_in_memory;
use twelveb_core::{
    AuthService, SettingsService, SettingsServiceError, SqliteSettingsRepository,
    SqliteUserRepository, Theme, UserSettings,
};

fn register(conn: &Connection) -> i64 {
    AuthService::new(SqliteUserRepository::try_new(conn).unwrap())
        .register("alice", "pw", "Q?", "A")
        .unwrap()
}

fn settings(conn: &Connection) -> SettingsService<SqliteSettingsRepository<'_>> {
    SettingsService::new(SqliteSettingsRepository::try_new(conn).unwrap())
}

fn settings_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM settings;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn missing_row_yields_defaults() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn);
    let service = settings(&conn);

    assert_eq!(service.get_settings(user).unwrap(), UserSettings::default());
    assert_eq!(settings_rows(&conn), 0);
}

#[test]
fn set_dark_mode_creates_then_updates_row() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn);
    let service = settings(&conn);

    service.set_dark_mode(user, true).unwrap();
    assert!(service.get_settings(user).unwrap().dark_mode);
    assert_eq!(settings_rows(&conn), 1);

    service.set_dark_mode(user, false).unwrap();
    let stored = service.get_settings(user).unwrap();
    assert!(!stored.dark_mode);
    assert_eq!(stored.font_size, 16);
    assert_eq!(stored.theme, Theme::Default);
    assert_eq!(settings_rows(&conn), 1);
}

#[test]
fn toggle_flips_state() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn);
    let service = settings(&conn);

    assert!(service.toggle_dark_mode(user).unwrap());
    assert!(!service.toggle_dark_mode(user).unwrap());
    assert!(!service.get_settings(user).unwrap().dark_mode);
}

#[test]
fn preferences_need_existing_row() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn);
    let service = settings(&conn);

    assert!(!service.set_preferences(user, 20, Theme::Light).unwrap());
    assert_eq!(settings_rows(&conn), 0);

    service.set_dark_mode(user, true).unwrap();
    assert!(service.set_preferences(user, 20, Theme::Light).unwrap());
    assert_eq!(
        service.get_settings(user).unwrap(),
        UserSettings {
            dark_mode: true,
            font_size: 20,
            theme: Theme::Light,
        }
    );
}

#[test]
fn font_size_outside_range_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn);
    let service = settings(&conn);
    service.set_dark_mode(user, false).unwrap();

    assert!(matches!(
        service.set_preferences(user, 7, Theme::Dark),
        Err(SettingsServiceError::InvalidFontSize(7))
    ));
    assert!(matches!(
        service.set_preferences(user, 73, Theme::Dark),
        Err(SettingsServiceError::InvalidFontSize(73))
    ));
    assert!(service.set_preferences(user, 8, Theme::Dark).unwrap());
    assert!(service.set_preferences(user, 72, Theme::Dark).unwrap());
}

#[test]
fn deleting_user_removes_settings() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn);
    settings(&conn).set_dark_mode(user, true).unwrap();

    AuthService::new(SqliteUserRepository::try_new(&conn).unwrap())
        .delete_user(user)
        .unwrap();
    assert_eq!(settings_rows(&conn), 0);
}
