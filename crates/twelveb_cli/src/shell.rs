//! Interactive session shell opened after a successful login.
//!
//! # Responsibility
//! - Parse one command per input line.
//! - Dispatch commands to core services bound to the session connection.
//!
//! # Invariants
//! - A failing command is reported and the session continues.
//! - Only `quit` or end of input ends the session.

use crate::console::Console;
use anyhow::{bail, Result};
use log::warn;
use rusqlite::Connection;
use std::io::{BufRead, Write};
use twelveb_core::{
    Page, PageAppearance, PageId, PageService, PageTreeNode, QuickNote, QuickNoteId,
    QuickNoteService, SettingsService, SqlitePageRepository, SqliteQuickNoteRepository,
    SqliteSettingsRepository, SqliteStickyNoteRepository, StickyNote, StickyNoteId,
    StickyNoteService, Theme, User,
};

const HELP: &str = "\
pages                          list pages
tree                           show the page hierarchy
open <id>                      show a page with its sticky notes
new <title>                    create a root page
child <parent> <title>         create a nested page
title <id> <text>              rename a page
write <id> <text>              replace the page body
move <id> <parent|root>        re-parent a page
color <id> <#rrggbb|none>      set the page colour
delete <id>                    delete a page (children become roots)
search [term]                  search titles and bodies; blank shows the tree
sticky add <page> <#rrggbb> <text>
sticky move <id> <x> <y>
sticky list <page>
sticky rm <id>
todo add <text> | todo list | todo check <id> | todo uncheck <id> | todo rm <id>
dark [on|off|toggle]           show or change dark mode
prefs <size> <theme>           set font size (8-72) and theme (default|dark|light)
settings                       show current settings
help                           show this text
quit                           end the session";

/// Requested dark-mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DarkMode {
    Show,
    On,
    Off,
    Toggle,
}

/// One parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Pages,
    Tree,
    Open(PageId),
    New(String),
    Child { parent_id: PageId, title: String },
    Title { page_id: PageId, title: String },
    Write { page_id: PageId, text: String },
    Move { page_id: PageId, parent_id: Option<PageId> },
    Color { page_id: PageId, color: Option<String> },
    Delete(PageId),
    Search(String),
    StickyAdd { page_id: PageId, color: String, text: String },
    StickyMove { note_id: StickyNoteId, x: i64, y: i64 },
    StickyList(PageId),
    StickyRemove(StickyNoteId),
    TodoAdd(String),
    TodoList,
    TodoCheck { note_id: QuickNoteId, checked: bool },
    TodoRemove(QuickNoteId),
    Dark(DarkMode),
    Prefs { font_size: u32, theme: Theme },
    Settings,
    Help,
    Quit,
}

/// Parses one input line.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let (word, rest) = split_word(line);
    let command = match word {
        "" => Command::Empty,
        "pages" => Command::Pages,
        "tree" => Command::Tree,
        "open" => Command::Open(parse_id(rest, "page id")?),
        "new" => Command::New(require_text(rest, "title")?),
        "child" => {
            let (parent, title) = split_word(rest);
            Command::Child {
                parent_id: parse_id(parent, "parent id")?,
                title: require_text(title, "title")?,
            }
        }
        "title" => {
            let (page, title) = split_word(rest);
            Command::Title {
                page_id: parse_id(page, "page id")?,
                title: require_text(title, "title")?,
            }
        }
        "write" => {
            let (page, text) = split_word(rest);
            Command::Write {
                page_id: parse_id(page, "page id")?,
                text: text.to_string(),
            }
        }
        "move" => {
            let (page, parent) = split_word(rest);
            let parent_id = match parent {
                "root" => None,
                other => Some(parse_id(other, "parent id")?),
            };
            Command::Move {
                page_id: parse_id(page, "page id")?,
                parent_id,
            }
        }
        "color" => {
            let (page, color) = split_word(rest);
            let color = match color {
                "" => return Err("usage: color <id> <#rrggbb|none>".to_string()),
                "none" => None,
                other => Some(other.to_string()),
            };
            Command::Color {
                page_id: parse_id(page, "page id")?,
                color,
            }
        }
        "delete" => Command::Delete(parse_id(rest, "page id")?),
        "search" => Command::Search(rest.to_string()),
        "sticky" => parse_sticky(rest)?,
        "todo" => parse_todo(rest)?,
        "dark" => Command::Dark(match rest {
            "" => DarkMode::Show,
            "on" => DarkMode::On,
            "off" => DarkMode::Off,
            "toggle" => DarkMode::Toggle,
            _ => return Err("usage: dark [on|off|toggle]".to_string()),
        }),
        "prefs" => {
            let (size, theme) = split_word(rest);
            let font_size = size
                .parse::<u32>()
                .map_err(|_| format!("invalid font size `{size}`"))?;
            Command::Prefs {
                font_size,
                theme: theme.parse()?,
            }
        }
        "settings" => Command::Settings,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command `{other}`; type `help`")),
    };
    Ok(command)
}

fn parse_sticky(args: &str) -> Result<Command, String> {
    let (action, rest) = split_word(args);
    match action {
        "add" => {
            let (page, rest) = split_word(rest);
            let (color, text) = split_word(rest);
            Ok(Command::StickyAdd {
                page_id: parse_id(page, "page id")?,
                color: color.to_string(),
                text: require_text(text, "note text")?,
            })
        }
        "move" => {
            let (note, rest) = split_word(rest);
            let (x, y) = split_word(rest);
            Ok(Command::StickyMove {
                note_id: parse_id(note, "note id")?,
                x: parse_coordinate(x)?,
                y: parse_coordinate(y)?,
            })
        }
        "list" => Ok(Command::StickyList(parse_id(rest, "page id")?)),
        "rm" => Ok(Command::StickyRemove(parse_id(rest, "note id")?)),
        _ => Err("usage: sticky add|move|list|rm ...".to_string()),
    }
}

fn parse_todo(args: &str) -> Result<Command, String> {
    let (action, rest) = split_word(args);
    match action {
        "add" => Ok(Command::TodoAdd(require_text(rest, "to-do text")?)),
        "list" | "" => Ok(Command::TodoList),
        "check" => Ok(Command::TodoCheck {
            note_id: parse_id(rest, "to-do id")?,
            checked: true,
        }),
        "uncheck" => Ok(Command::TodoCheck {
            note_id: parse_id(rest, "to-do id")?,
            checked: false,
        }),
        "rm" => Ok(Command::TodoRemove(parse_id(rest, "to-do id")?)),
        _ => Err("usage: todo add|list|check|uncheck|rm ...".to_string()),
    }
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    }
}

fn parse_id(raw: &str, what: &str) -> Result<i64, String> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| format!("expected {what}, got `{}`", raw.trim()))
}

fn parse_coordinate(raw: &str) -> Result<i64, String> {
    raw.parse::<i64>()
        .map_err(|_| format!("invalid coordinate `{raw}`"))
}

fn require_text(raw: &str, what: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(format!("missing {what}"));
    }
    Ok(trimmed.to_string())
}

/// Session bound to one logged-in user and one open connection.
pub struct Shell<'conn> {
    user: User,
    pages: PageService<SqlitePageRepository<'conn>>,
    stickies: StickyNoteService<SqliteStickyNoteRepository<'conn>>,
    settings: SettingsService<SqliteSettingsRepository<'conn>>,
    todos: QuickNoteService<SqliteQuickNoteRepository<'conn>>,
}

impl<'conn> Shell<'conn> {
    pub fn new(conn: &'conn Connection, user: User) -> Result<Self> {
        Ok(Self {
            user,
            pages: PageService::new(SqlitePageRepository::try_new(conn)?),
            stickies: StickyNoteService::new(SqliteStickyNoteRepository::try_new(conn)?),
            settings: SettingsService::new(SqliteSettingsRepository::try_new(conn)?),
            todos: QuickNoteService::new(SqliteQuickNoteRepository::try_new(conn)?),
        })
    }

    /// Runs the read-eval loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&self, console: &mut Console<R, W>) -> Result<()> {
        let welcome = self.pages.ensure_welcome_page(self.user.id)?;
        writeln!(
            console.out(),
            "Logged in as {}. Your welcome page is #{welcome}; type `help` for commands.",
            self.user.username
        )?;

        let prompt = format!("{}> ", self.user.username);
        while let Some(line) = console.next_line(&prompt)? {
            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(message) => {
                    writeln!(console.out(), "{message}")?;
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }
            if let Err(err) = self.execute(command, console.out()) {
                warn!(
                    "event=shell_command module=cli status=error user_id={} error={err}",
                    self.user.id
                );
                writeln!(console.out(), "error: {err}")?;
            }
        }
        Ok(())
    }

    fn execute(&self, command: Command, out: &mut impl Write) -> Result<()> {
        let user_id = self.user.id;
        match command {
            Command::Empty | Command::Quit => {}
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Pages => {
                for page in self.pages.list_pages(user_id)? {
                    match page.parent_id {
                        Some(parent_id) => {
                            writeln!(out, "#{} {} (in #{parent_id})", page.id, page.title)?
                        }
                        None => writeln!(out, "#{} {}", page.id, page.title)?,
                    }
                }
            }
            Command::Tree => {
                for root in self.pages.page_tree(user_id)? {
                    write_tree(out, &root, 0)?;
                }
            }
            Command::Open(page_id) => {
                let page = self.owned_page(page_id)?;
                write_page(out, &page)?;
                for note in self.stickies.list_sticky_notes(page_id)? {
                    writeln!(
                        out,
                        "  [sticky #{} {} at ({}, {})] {}",
                        note.id, note.color, note.x, note.y, note.content
                    )?;
                }
            }
            Command::New(title) => {
                let page_id = self.pages.create_page(user_id, &title, None)?;
                writeln!(out, "created page #{page_id}")?;
            }
            Command::Child { parent_id, title } => {
                let page_id = self.pages.create_page(user_id, &title, Some(parent_id))?;
                writeln!(out, "created page #{page_id} under #{parent_id}")?;
            }
            Command::Title { page_id, title } => {
                self.owned_page(page_id)?;
                self.pages.update_title(page_id, &title)?;
                writeln!(out, "renamed page #{page_id}")?;
            }
            Command::Write { page_id, text } => {
                self.owned_page(page_id)?;
                self.pages.update_content(page_id, &text)?;
                writeln!(out, "saved page #{page_id}")?;
            }
            Command::Move { page_id, parent_id } => {
                self.owned_page(page_id)?;
                self.pages.move_page(page_id, parent_id)?;
                writeln!(out, "moved page #{page_id}")?;
            }
            Command::Color { page_id, color } => {
                let page = self.owned_page(page_id)?;
                self.pages.set_appearance(
                    page_id,
                    PageAppearance {
                        icon: page.icon,
                        cover: page.cover,
                        color,
                    },
                )?;
                writeln!(out, "updated page #{page_id}")?;
            }
            Command::Delete(page_id) => {
                self.owned_page(page_id)?;
                self.pages.delete_page(page_id)?;
                writeln!(out, "deleted page #{page_id}")?;
            }
            Command::Search(term) if term.trim().is_empty() => {
                for root in self.pages.page_tree(user_id)? {
                    write_tree(out, &root, 0)?;
                }
            }
            Command::Search(term) => {
                let hits = self.pages.search_pages(user_id, &term)?;
                if hits.is_empty() {
                    writeln!(out, "no matches")?;
                }
                for hit in hits {
                    writeln!(out, "#{} {}", hit.page_id, hit.title)?;
                }
            }
            Command::StickyAdd {
                page_id,
                color,
                text,
            } => {
                self.owned_page(page_id)?;
                let note_id = self.stickies.add_sticky_note(page_id, &text, &color)?;
                writeln!(out, "added sticky note #{note_id}")?;
            }
            Command::StickyMove { note_id, x, y } => {
                self.owned_sticky_note(note_id)?;
                self.stickies.update_position(note_id, x, y)?;
                writeln!(out, "moved sticky note #{note_id} to ({x}, {y})")?;
            }
            Command::StickyList(page_id) => {
                self.owned_page(page_id)?;
                for note in self.stickies.list_sticky_notes(page_id)? {
                    writeln!(
                        out,
                        "#{} {} ({}, {}) {}",
                        note.id, note.color, note.x, note.y, note.content
                    )?;
                }
            }
            Command::StickyRemove(note_id) => {
                self.owned_sticky_note(note_id)?;
                self.stickies.delete_sticky_note(note_id)?;
                writeln!(out, "removed sticky note #{note_id}")?;
            }
            Command::TodoAdd(text) => {
                let note_id = self.todos.add(user_id, &text)?;
                writeln!(out, "added to-do #{note_id}")?;
            }
            Command::TodoList => {
                for note in self.todos.list(user_id)? {
                    let mark = if note.checked { 'x' } else { ' ' };
                    writeln!(out, "[{mark}] #{} {}", note.id, note.text)?;
                }
            }
            Command::TodoCheck { note_id, checked } => {
                self.owned_todo(note_id)?;
                self.todos.set_checked(note_id, checked)?;
                writeln!(out, "updated to-do #{note_id}")?;
            }
            Command::TodoRemove(note_id) => {
                self.owned_todo(note_id)?;
                self.todos.delete(note_id)?;
                writeln!(out, "removed to-do #{note_id}")?;
            }
            Command::Dark(mode) => {
                let enabled = match mode {
                    DarkMode::Show => self.settings.get_settings(user_id)?.dark_mode,
                    DarkMode::On => {
                        self.settings.set_dark_mode(user_id, true)?;
                        true
                    }
                    DarkMode::Off => {
                        self.settings.set_dark_mode(user_id, false)?;
                        false
                    }
                    DarkMode::Toggle => self.settings.toggle_dark_mode(user_id)?,
                };
                writeln!(out, "dark mode {}", if enabled { "on" } else { "off" })?;
            }
            Command::Prefs { font_size, theme } => {
                if self.settings.set_preferences(user_id, font_size, theme)? {
                    writeln!(out, "preferences saved")?;
                } else {
                    writeln!(out, "no settings stored yet; set dark mode first")?;
                }
            }
            Command::Settings => {
                let settings = self.settings.get_settings(user_id)?;
                writeln!(
                    out,
                    "dark mode: {}\nfont size: {}\ntheme: {}",
                    if settings.dark_mode { "on" } else { "off" },
                    settings.font_size,
                    settings.theme
                )?;
            }
        }
        Ok(())
    }

    /// Loads a page and rejects pages of other users.
    fn owned_page(&self, page_id: PageId) -> Result<Page> {
        let page = self.pages.get_page(page_id)?;
        if page.user_id != self.user.id {
            bail!("page not found: {page_id}");
        }
        Ok(page)
    }

    /// Loads a sticky note whose page belongs to the session user.
    fn owned_sticky_note(&self, note_id: StickyNoteId) -> Result<StickyNote> {
        let note = self.stickies.get_sticky_note(note_id)?;
        if self.pages.get_page(note.page_id)?.user_id != self.user.id {
            bail!("sticky note not found: {note_id}");
        }
        Ok(note)
    }

    /// Loads a to-do owned by the session user.
    fn owned_todo(&self, note_id: QuickNoteId) -> Result<QuickNote> {
        let note = self.todos.get(note_id)?;
        if note.user_id != self.user.id {
            bail!("to-do not found: {note_id}");
        }
        Ok(note)
    }
}

fn write_tree(out: &mut impl Write, node: &PageTreeNode, depth: usize) -> Result<()> {
    writeln!(out, "{}#{} {}", "  ".repeat(depth), node.id, node.title)?;
    for child in &node.children {
        write_tree(out, child, depth + 1)?;
    }
    Ok(())
}

fn write_page(out: &mut impl Write, page: &Page) -> Result<()> {
    writeln!(out, "#{} {}", page.id, page.title)?;
    if let Some(color) = &page.color {
        writeln!(out, "colour: {color}")?;
    }
    if let Some(icon) = &page.icon {
        writeln!(out, "icon: {icon}")?;
    }
    if let Some(parent_id) = page.parent_id {
        writeln!(out, "parent: #{parent_id}")?;
    }
    writeln!(out, "---")?;
    writeln!(out, "{}", page.content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_command, Command, DarkMode, Shell};
    use crate::console::Console;
    use rusqlite::Connection;
    use std::io::Cursor;
    use twelveb_core::db::open_db_in_memory;
    use twelveb_core::{AuthService, SqliteUserRepository, Theme};

    fn run_session(conn: &Connection, username: &str, script: &str) -> String {
        let auth = AuthService::new(SqliteUserRepository::try_new(conn).unwrap());
        let user_id = match auth.authenticate(username, "pw") {
            Ok(user_id) => user_id,
            Err(_) => auth.register(username, "pw", "Pet?", "Rex").unwrap(),
        };
        let user = auth.get_user(user_id).unwrap();
        let shell = Shell::new(conn, user).unwrap();
        let mut console = Console::new(Cursor::new(script.to_string()), Vec::new());
        shell.run(&mut console).unwrap();
        String::from_utf8(console.into_output()).unwrap()
    }

    #[test]
    fn parses_commands_with_free_text() {
        assert_eq!(
            parse_command("child 3 Garden plans").unwrap(),
            Command::Child {
                parent_id: 3,
                title: "Garden plans".to_string()
            }
        );
        assert_eq!(
            parse_command("  sticky add 4 #ffff88 call the plumber ").unwrap(),
            Command::StickyAdd {
                page_id: 4,
                color: "#ffff88".to_string(),
                text: "call the plumber".to_string()
            }
        );
        assert_eq!(
            parse_command("move 5 root").unwrap(),
            Command::Move {
                page_id: 5,
                parent_id: None
            }
        );
        assert_eq!(
            parse_command("prefs 18 Dark").unwrap(),
            Command::Prefs {
                font_size: 18,
                theme: Theme::Dark
            }
        );
        assert_eq!(parse_command("dark").unwrap(), Command::Dark(DarkMode::Show));
        assert_eq!(parse_command("").unwrap(), Command::Empty);
    }

    #[test]
    fn rejects_malformed_commands() {
        assert!(parse_command("open abc").is_err());
        assert!(parse_command("new   ").is_err());
        assert!(parse_command("sticky move 1 x 2").is_err());
        assert!(parse_command("dark maybe").is_err());
        assert!(parse_command("prefs 18 neon").is_err());
        assert!(parse_command("launch").is_err());
    }

    #[test]
    fn session_runs_commands_and_survives_errors() {
        let conn = open_db_in_memory().unwrap();
        let auth = AuthService::new(SqliteUserRepository::try_new(&conn).unwrap());
        let user_id = auth.register("alice", "pw", "Pet?", "Rex").unwrap();
        let user = auth.get_user(user_id).unwrap();
        let shell = Shell::new(&conn, user).unwrap();

        let script = "new Apple pie\nopen 999\nsearch apple\ntodo add buy flour\ntodo list\ndark toggle\nquit\nnew Unreached\n";
        let mut console = Console::new(Cursor::new(script), Vec::new());
        shell.run(&mut console).unwrap();
        let output = String::from_utf8(console.into_output()).unwrap();

        assert!(output.contains("Logged in as alice"));
        assert!(output.contains("created page #2"));
        assert!(output.contains("error: page not found: 999"));
        assert!(output.contains("#2 Apple pie"));
        assert!(output.contains("[ ] #1 buy flour"));
        assert!(output.contains("dark mode on"));
        assert!(!output.contains("Unreached"));
    }

    #[test]
    fn notes_of_other_users_cannot_be_changed() {
        let conn = open_db_in_memory().unwrap();
        let output = run_session(&conn, "alice", "sticky add 1 #ffff88 secret\ntodo add private\n");
        assert!(output.contains("added sticky note #1"));
        assert!(output.contains("added to-do #1"));

        let output = run_session(
            &conn,
            "bob",
            "sticky move 1 500 500\nsticky rm 1\nsticky list 1\ntodo check 1\ntodo rm 1\n",
        );
        assert_eq!(output.matches("error: sticky note not found: 1").count(), 2);
        assert!(output.contains("error: page not found: 1"));
        assert_eq!(output.matches("error: to-do not found: 1").count(), 2);

        let (x, y): (i64, i64) = conn
            .query_row(
                "SELECT position_x, position_y FROM sticky_notes WHERE id = 1;",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((x, y), (0, 0));
        let checked: i64 = conn
            .query_row("SELECT checked FROM quick_notes WHERE id = 1;", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(checked, 0);

        let output = run_session(&conn, "alice", "sticky move 1 5 6\ntodo check 1\n");
        assert!(output.contains("moved sticky note #1 to (5, 6)"));
        assert!(output.contains("updated to-do #1"));
    }

    #[test]
    fn blank_search_shows_page_tree() {
        let conn = open_db_in_memory().unwrap();
        let output = run_session(&conn, "alice", "child 1 Nested\nsearch   \n");
        assert!(output.contains("#1 Welcome to TwelveB\n  #2 Nested"));
        assert!(!output.contains("no matches"));
    }
}
