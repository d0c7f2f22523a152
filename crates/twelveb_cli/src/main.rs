//! `twelveb` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from `twelveb.toml` and command-line overrides.
//! - Run the account flows and hand a logged-in user to the shell.
//!
//! # Invariants
//! - Only `init` creates a database file; every other command requires it.
//! - One connection is opened per process and passed to every service.

mod console;
mod shell;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use console::Console;
use log::{error, info};
use rusqlite::Connection;
use shell::Shell;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use twelveb_core::db::migrations::current_user_version;
use twelveb_core::{
    init_logging, load_config, open_db, open_existing_db, AppConfig, AuthService,
    AuthServiceError, SqliteUserRepository,
};

#[derive(Parser)]
#[command(name = "twelveb")]
#[command(version)]
#[command(about = "Pages, sticky notes and to-dos kept in a local SQLite file")]
struct Cli {
    /// Config file (defaults to ./twelveb.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files, overriding the config
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database file and apply migrations
    Init,
    /// Create a new account
    Register,
    /// Log in and open the interactive shell
    Login,
    /// Reset a password by answering the security question
    ForgotPassword,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if let Some(log_dir) = &config.log_dir {
        init_logging(config.effective_log_level(), log_dir)
            .with_context(|| format!("failed to start logging in {}", log_dir.display()))?;
    }

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());

    match cli.command {
        Commands::Init => {
            let conn = open_db(&config.database_path).with_context(|| {
                format!("failed to create database {}", config.database_path.display())
            })?;
            writeln!(
                console.out(),
                "database ready at {} (schema version {})",
                config.database_path.display(),
                current_user_version(&conn)?
            )?;
        }
        Commands::Register => register(&open_session_db(&config)?, &mut console)?,
        Commands::Login => login(&open_session_db(&config)?, &mut console)?,
        Commands::ForgotPassword => forgot_password(&open_session_db(&config)?, &mut console)?,
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        config.database_path = db.clone();
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = Some(level.clone());
    }
    Ok(config)
}

fn open_session_db(config: &AppConfig) -> Result<Connection> {
    match open_existing_db(&config.database_path) {
        Ok(conn) => Ok(conn),
        Err(err) if err.is_connectivity_failure() => {
            error!(
                "event=session_start module=cli status=error path={} error={err}",
                config.database_path.display()
            );
            bail!(
                "cannot open database {} ({err}); run `twelveb init` first",
                config.database_path.display()
            )
        }
        Err(err) => Err(err.into()),
    }
}

fn auth_service(conn: &Connection) -> Result<AuthService<SqliteUserRepository<'_>>> {
    Ok(AuthService::new(SqliteUserRepository::try_new(conn)?))
}

fn register<R: BufRead, W: Write>(conn: &Connection, console: &mut Console<R, W>) -> Result<()> {
    let auth = auth_service(conn)?;
    let username = console.ask("Username: ")?;
    let password = console.ask("Password: ")?;
    if console.ask("Repeat password: ")? != password {
        bail!("passwords do not match");
    }
    let question = console.ask("Security question: ")?;
    let answer = console.ask("Answer: ")?;

    match auth.register(&username, &password, &question, &answer) {
        Ok(user_id) => {
            writeln!(console.out(), "account #{user_id} created; you can log in now")?;
            Ok(())
        }
        Err(AuthServiceError::DuplicateUsername(name)) => {
            bail!("username `{name}` is already taken")
        }
        Err(err) => Err(err.into()),
    }
}

fn login<R: BufRead, W: Write>(conn: &Connection, console: &mut Console<R, W>) -> Result<()> {
    let auth = auth_service(conn)?;
    let username = console.ask("Username: ")?;
    let password = console.ask("Password: ")?;

    let user_id = match auth.authenticate(&username, &password) {
        Ok(user_id) => user_id,
        Err(AuthServiceError::NotFound) => bail!("invalid username or password"),
        Err(err) => return Err(err.into()),
    };
    let user = auth.get_user(user_id)?;
    info!("event=session_start module=cli status=ok user_id={user_id}");

    Shell::new(conn, user)?.run(console)?;
    info!("event=session_end module=cli status=ok user_id={user_id}");
    Ok(())
}

fn forgot_password<R: BufRead, W: Write>(
    conn: &Connection,
    console: &mut Console<R, W>,
) -> Result<()> {
    let auth = auth_service(conn)?;
    let username = console.ask("Username: ")?;
    let question = match auth.security_question(&username) {
        Ok(question) => question,
        Err(AuthServiceError::NotFound) => bail!("no account named `{}`", username.trim()),
        Err(err) => return Err(err.into()),
    };

    let answer = console.ask(&format!("{question} "))?;
    let token = auth.begin_password_reset(&username, &answer)?;
    let new_password = console.ask("New password: ")?;
    auth.complete_password_reset(&username, &token.token, &new_password)?;
    writeln!(console.out(), "password updated; you can log in now")?;
    Ok(())
}
