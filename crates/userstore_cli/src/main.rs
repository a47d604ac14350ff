//! Command-line front end for the user roster.
//!
//! # Responsibility
//! - Drive the same add/delete/rename operations a UI would, against a
//!   SQLite-backed store file.
//! - Print the count and cats selectors next to the list.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use userstore_core::{
    default_log_level, init_logging, MutationOutcome, RecordId, RecordStore, SqliteStorage,
    UserService,
};

const DB_PATH_ENV: &str = "USERSTORE_DB_PATH";
const DEFAULT_DB_FILE_NAME: &str = "userstore.sqlite3";

#[derive(Debug, Parser)]
#[command(name = "userstore", version, about = "Manage the persisted user roster")]
struct Cli {
    /// Store database file.
    #[arg(long, env = DB_PATH_ENV)]
    db: Option<PathBuf>,

    /// Directory for rolling log files (absolute path).
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a user and print its id.
    Add { name: String, email: String },
    /// Delete a user by id.
    Delete { id: RecordId },
    /// Replace a user's name.
    Rename { id: RecordId, name: String },
    /// List users with count and cats.
    List,
    /// Print the count and cats selectors only.
    Stats,
    /// Remove the persisted roster from the database.
    Clear,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        if let Err(err) = init_logging(default_log_level().as_str(), &log_dir.to_string_lossy()) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let db_path = cli
        .db
        .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));
    let storage = match SqliteStorage::open(&db_path) {
        Ok(storage) => storage,
        Err(err) => {
            eprintln!("error: cannot open {}: {err}", db_path.display());
            return ExitCode::FAILURE;
        }
    };
    let mut service = UserService::new(RecordStore::new(storage));

    let code = run(&mut service, cli.command);
    if let Some(err) = service.store().last_write_error() {
        eprintln!("warning: change not saved: {err}");
        return ExitCode::FAILURE;
    }
    code
}

fn run(service: &mut UserService<SqliteStorage>, command: Command) -> ExitCode {
    match command {
        Command::Add { name, email } => {
            let record = service.register(name, email);
            println!("added {}", record.id);
            ExitCode::SUCCESS
        }
        Command::Delete { id } => report(service.remove(id), "deleted"),
        Command::Rename { id, name } => report(service.rename(id, name), "renamed"),
        Command::List => {
            for user in service.users() {
                println!("{}\t{}\t{}", user.id, user.name, user.email);
            }
            print_stats(service);
            ExitCode::SUCCESS
        }
        Command::Stats => {
            print_stats(service);
            ExitCode::SUCCESS
        }
        Command::Clear => match service.store_mut().clear_storage() {
            Ok(()) => {
                println!("cleared");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::FAILURE
            }
        },
    }
}

fn report(outcome: MutationOutcome, verb: &str) -> ExitCode {
    match outcome {
        MutationOutcome::Applied => {
            println!("{verb}");
            ExitCode::SUCCESS
        }
        MutationOutcome::Unchanged => {
            println!("unchanged");
            ExitCode::SUCCESS
        }
        MutationOutcome::NotFound(id) => {
            eprintln!("user {id} not found");
            ExitCode::FAILURE
        }
    }
}

fn print_stats(service: &UserService<SqliteStorage>) {
    println!("total: {}", service.user_count());
    println!("cats: {}", service.cats().join(" "));
}
