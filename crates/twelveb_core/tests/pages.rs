use rusqlite::Connection;
use twelveb_core::db::open_db_in_memory;
use twelveb_core::{
    AuthService, PageAppearance, PageService, PageServiceError, SqlitePageRepository,
    SqliteStickyNoteRepository, SqliteUserRepository, StickyNoteService, WELCOME_PAGE_TITLE,
};

fn register(conn: &Connection, username: &str) -> i64 {
    AuthService::new(SqliteUserRepository::try_new(conn).unwrap())
        .register(username, "pw", "Q?", "A")
        .unwrap()
}

fn pages(conn: &Connection) -> PageService<SqlitePageRepository<'_>> {
    PageService::new(SqlitePageRepository::try_new(conn).unwrap())
}

#[test]
fn create_and_get_page() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn, "alice");
    let service = pages(&conn);

    let page_id = service.create_page(user, "  Groceries ", None).unwrap();
    let page = service.get_page(page_id).unwrap();
    assert_eq!(page.title, "Groceries");
    assert_eq!(page.content, "");
    assert_eq!(page.user_id, user);
    assert_eq!(page.parent_id, None);
}

#[test]
fn create_page_rejects_blank_title_and_unknown_user() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn, "alice");
    let service = pages(&conn);

    assert!(matches!(
        service.create_page(user, "   ", None),
        Err(PageServiceError::InvalidTitle)
    ));
    assert!(matches!(
        service.create_page(999, "Title", None),
        Err(PageServiceError::UserNotFound(999))
    ));
}

#[test]
fn create_page_rejects_foreign_or_missing_parent() {
    let conn = open_db_in_memory().unwrap();
    let alice = register(&conn, "alice");
    let bob = register(&conn, "bob");
    let service = pages(&conn);
    let bobs_page = service.create_page(bob, "Bob's", None).unwrap();

    assert!(matches!(
        service.create_page(alice, "Child", Some(bobs_page)),
        Err(PageServiceError::ParentOwnedByOtherUser { page_id: None, parent_id }) if parent_id == bobs_page
    ));
    assert!(matches!(
        service.create_page(alice, "Child", Some(12345)),
        Err(PageServiceError::ParentNotFound(12345))
    ));
}

#[test]
fn updates_stamp_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn, "alice");
    let service = pages(&conn);
    let page_id = service.create_page(user, "Draft", None).unwrap();

    conn.execute("UPDATE pages SET updated_at = 0 WHERE id = ?1;", [page_id])
        .unwrap();
    service.update_title(page_id, "Final").unwrap();
    let after_title = service.get_page(page_id).unwrap();
    assert_eq!(after_title.title, "Final");
    assert!(after_title.updated_at > 0);

    conn.execute("UPDATE pages SET updated_at = 0 WHERE id = ?1;", [page_id])
        .unwrap();
    service.update_content(page_id, "Body text").unwrap();
    let after_content = service.get_page(page_id).unwrap();
    assert_eq!(after_content.content, "Body text");
    assert!(after_content.updated_at > 0);
}

#[test]
fn updating_missing_page_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = pages(&conn);
    assert!(matches!(
        service.update_content(77, "x"),
        Err(PageServiceError::PageNotFound(77))
    ));
}

#[test]
fn list_pages_is_scoped_to_user_and_ordered() {
    let conn = open_db_in_memory().unwrap();
    let alice = register(&conn, "alice");
    let bob = register(&conn, "bob");
    let service = pages(&conn);

    let first = service.create_page(alice, "First", None).unwrap();
    let second = service.create_page(alice, "Second", Some(first)).unwrap();
    service.create_page(bob, "Bob only", None).unwrap();

    let listed = service.list_pages(alice).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first);
    assert_eq!(listed[1].id, second);
    assert_eq!(listed[1].parent_id, Some(first));
}

#[test]
fn deleting_parent_promotes_child_to_root() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn, "alice");
    let service = pages(&conn);
    let parent = service.create_page(user, "A", None).unwrap();
    let child = service.create_page(user, "B", Some(parent)).unwrap();

    let tree = service.page_tree(user).unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].children[0].id, child);

    service.delete_page(parent).unwrap();

    let listed = service.list_pages(user).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, child);
    assert_eq!(listed[0].parent_id, None);
    let tree = service.page_tree(user).unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].id, child);
}

#[test]
fn deleting_page_removes_its_sticky_notes() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn, "alice");
    let service = pages(&conn);
    let page_id = service.create_page(user, "Board", None).unwrap();
    StickyNoteService::new(SqliteStickyNoteRepository::try_new(&conn).unwrap())
        .add_sticky_note(page_id, "remember", "#ffff88")
        .unwrap();

    service.delete_page(page_id).unwrap();
    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM sticky_notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn deleting_user_cascades_to_pages_and_sticky_notes() {
    let conn = open_db_in_memory().unwrap();
    let alice = register(&conn, "alice");
    let bob = register(&conn, "bob");
    let service = pages(&conn);
    let page_id = service.create_page(alice, "Mine", None).unwrap();
    service.create_page(alice, "Nested", Some(page_id)).unwrap();
    let bobs_page = service.create_page(bob, "Bob's", None).unwrap();
    let notes = StickyNoteService::new(SqliteStickyNoteRepository::try_new(&conn).unwrap());
    notes.add_sticky_note(page_id, "a", "#ffff88").unwrap();
    notes.add_sticky_note(bobs_page, "b", "#88ff88").unwrap();

    AuthService::new(SqliteUserRepository::try_new(&conn).unwrap())
        .delete_user(alice)
        .unwrap();

    assert!(service.list_pages(alice).unwrap().is_empty());
    let sticky_owners: Vec<i64> = {
        let mut stmt = conn.prepare("SELECT page_id FROM sticky_notes;").unwrap();
        let rows = stmt.query_map([], |row| row.get(0)).unwrap();
        rows.map(Result::unwrap).collect()
    };
    assert_eq!(sticky_owners, vec![bobs_page]);
    assert_eq!(service.list_pages(bob).unwrap().len(), 1);
}

#[test]
fn search_matches_title_and_content_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn, "alice");
    let other = register(&conn, "bob");
    let service = pages(&conn);

    let pie = service.create_page(user, "Apple pie", None).unwrap();
    let list = service.create_page(user, "Shopping", None).unwrap();
    service
        .update_content(list, "buy one APPLE and pears")
        .unwrap();
    service.create_page(user, "Unrelated", None).unwrap();
    service.create_page(other, "apple for bob", None).unwrap();

    let hits = service.search_pages(user, "apple").unwrap();
    let ids: Vec<i64> = hits.iter().map(|hit| hit.page_id).collect();
    assert_eq!(ids, vec![pie, list]);

    assert!(service.search_pages(user, "banana").unwrap().is_empty());
    assert!(service.search_pages(user, "   ").unwrap().is_empty());
}

#[test]
fn search_folds_case_beyond_ascii() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn, "alice");
    let service = pages(&conn);
    let school = service.create_page(user, "École notes", None).unwrap();
    let dessert = service.create_page(user, "Dessert", None).unwrap();
    service.update_content(dessert, "Crème BRÛLÉE").unwrap();

    let hits = service.search_pages(user, "école").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].page_id, school);

    let hits = service.search_pages(user, "brûlée").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].page_id, dessert);

    assert_eq!(service.search_pages(user, "ÉCOLE").unwrap().len(), 1);
}

#[test]
fn search_treats_like_wildcards_literally() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn, "alice");
    let service = pages(&conn);
    let sale = service.create_page(user, "50% off", None).unwrap();
    service.create_page(user, "500 items", None).unwrap();

    let hits = service.search_pages(user, "50%").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].page_id, sale);
}

#[test]
fn move_page_reparents_and_rejects_cycles() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn, "alice");
    let service = pages(&conn);
    let a = service.create_page(user, "A", None).unwrap();
    let b = service.create_page(user, "B", Some(a)).unwrap();
    let c = service.create_page(user, "C", None).unwrap();

    service.move_page(c, Some(b)).unwrap();
    assert_eq!(service.get_page(c).unwrap().parent_id, Some(b));

    assert!(matches!(
        service.move_page(a, Some(c)),
        Err(PageServiceError::CycleDetected { page_id, parent_id }) if page_id == a && parent_id == c
    ));
    assert!(matches!(
        service.move_page(a, Some(a)),
        Err(PageServiceError::CycleDetected { .. })
    ));

    service.move_page(c, None).unwrap();
    assert_eq!(service.get_page(c).unwrap().parent_id, None);
}

#[test]
fn move_page_rejects_parent_of_other_user() {
    let conn = open_db_in_memory().unwrap();
    let alice = register(&conn, "alice");
    let bob = register(&conn, "bob");
    let service = pages(&conn);
    let mine = service.create_page(alice, "Mine", None).unwrap();
    let theirs = service.create_page(bob, "Theirs", None).unwrap();

    assert!(matches!(
        service.move_page(mine, Some(theirs)),
        Err(PageServiceError::ParentOwnedByOtherUser { page_id: Some(_), .. })
    ));
}

#[test]
fn set_appearance_validates_and_normalizes_color() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn, "alice");
    let service = pages(&conn);
    let page_id = service.create_page(user, "Styled", None).unwrap();

    service
        .set_appearance(
            page_id,
            PageAppearance {
                icon: Some("📒".to_string()),
                cover: Some("  ".to_string()),
                color: Some("#F0F8FF".to_string()),
            },
        )
        .unwrap();
    let page = service.get_page(page_id).unwrap();
    assert_eq!(page.icon.as_deref(), Some("📒"));
    assert_eq!(page.cover, None);
    assert_eq!(page.color.as_deref(), Some("#f0f8ff"));

    let err = service
        .set_appearance(
            page_id,
            PageAppearance {
                color: Some("aliceblue".to_string()),
                ..PageAppearance::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, PageServiceError::InvalidColor(_)));
}

#[test]
fn welcome_page_is_created_once() {
    let conn = open_db_in_memory().unwrap();
    let user = register(&conn, "alice");
    let service = pages(&conn);

    let first = service.ensure_welcome_page(user).unwrap();
    let second = service.ensure_welcome_page(user).unwrap();
    assert_eq!(first, second);

    let page = service.get_page(first).unwrap();
    assert_eq!(page.title, WELCOME_PAGE_TITLE);
    assert_eq!(page.color.as_deref(), Some("#f0f8ff"));
    assert!(!page.content.is_empty());
    assert_eq!(service.list_pages(user).unwrap().len(), 1);
}
