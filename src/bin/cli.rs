//! LendingDesk CLI
//!
//! Command-line interface over a local record store.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use lendingdesk::store::BookStore;
use lendingdesk::wal::WalRecovery;
use lendingdesk::{
    BookId, Config, LendingDesk, LendingError, MemberId, NewBook, NewMember, RecordStore,
};
use tracing_subscriber::{fmt, EnvFilter};

/// LendingDesk CLI
#[derive(Parser, Debug)]
#[command(name = "lendingdesk")]
#[command(about = "Borrow and return books against a local record store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./lendingdesk_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage books
    #[command(subcommand)]
    Book(BookCommand),

    /// Manage members
    #[command(subcommand)]
    Member(MemberCommand),

    /// Lend a book to a member
    Borrow {
        /// Book id
        book: u64,
        /// Member id
        member: u64,
    },

    /// Return a borrowed book
    Return {
        /// Book id
        book: u64,
    },

    /// Write a snapshot and truncate the WAL
    Checkpoint,

    /// Check the WAL for corruption without modifying it
    VerifyWal,
}

#[derive(Subcommand, Debug)]
enum BookCommand {
    /// Add a book
    Add { title: String, author: String, isbn: String },
    /// Show a book
    Get { id: u64 },
    /// List all books
    List,
    /// Replace title, author and ISBN
    Update { id: u64, title: String, author: String, isbn: String },
    /// Delete a book
    Delete { id: u64 },
}

#[derive(Subcommand, Debug)]
enum MemberCommand {
    /// Register a member
    Add { name: String, email: String },
    /// Show a member
    Get { id: u64 },
    /// List all members
    List,
    /// Replace name and email
    Update { id: u64, name: String, email: String },
    /// Delete a member
    Delete { id: u64 },
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lendingdesk=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!(
        "LendingDesk v{}, data directory {}",
        lendingdesk::VERSION,
        args.data_dir.display()
    );

    if let Commands::VerifyWal = args.command {
        return verify_wal(&args.data_dir);
    }

    let config = Config::builder().data_dir(&args.data_dir).build();
    let store = match RecordStore::open(config) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Failed to open record store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = run(&store, args.command);

    match Arc::try_unwrap(store) {
        Ok(store) => {
            if let Err(e) = store.close() {
                tracing::error!("Failed to close record store: {}", e);
                return ExitCode::FAILURE;
            }
        }
        Err(_) => tracing::warn!("Record store still shared at exit; skipping close"),
    }

    code
}

fn run(store: &Arc<RecordStore>, command: Commands) -> ExitCode {
    let result: Result<(), Box<dyn std::error::Error>> = match command {
        Commands::Book(cmd) => run_book(store, cmd),
        Commands::Member(cmd) => run_member(store, cmd),
        Commands::Borrow { book, member } => {
            let desk = LendingDesk::new(store.clone(), store.clone());
            let result = desk.borrow(BookId(book), MemberId(member));
            return lending_exit(result, "Book borrowed successfully");
        }
        Commands::Return { book } => {
            let desk = LendingDesk::new(store.clone(), store.clone());
            let result = desk.return_book(BookId(book));
            return lending_exit(result, "Book returned successfully");
        }
        Commands::Checkpoint => store.checkpoint().map_err(Into::into),
        Commands::VerifyWal => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_book(store: &RecordStore, cmd: BookCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        BookCommand::Add { title, author, isbn } => {
            let book = store.insert_book(NewBook::new(title, author, isbn))?;
            println!("{:?}", book);
        }
        BookCommand::Get { id } => match store.get_book(BookId(id))? {
            Some(book) => println!("{:?}", book),
            None => return Err(format!("Book not found with id: {}", id).into()),
        },
        BookCommand::List => {
            for book in store.list_books() {
                println!("{:?}", book);
            }
        }
        BookCommand::Update { id, title, author, isbn } => {
            let book = store.update_book(BookId(id), NewBook::new(title, author, isbn))?;
            println!("{:?}", book);
        }
        BookCommand::Delete { id } => store.delete_book(BookId(id))?,
    }
    Ok(())
}

fn run_member(store: &RecordStore, cmd: MemberCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        MemberCommand::Add { name, email } => {
            let member = store.insert_member(NewMember::new(name, email))?;
            println!("{:?}", member);
        }
        MemberCommand::Get { id } => match store.get_member(MemberId(id)) {
            Some(member) => println!("{:?}", member),
            None => return Err(format!("Member not found with id: {}", id).into()),
        },
        MemberCommand::List => {
            for member in store.list_members() {
                println!("{:?}", member);
            }
        }
        MemberCommand::Update { id, name, email } => {
            let member = store.update_member(MemberId(id), NewMember::new(name, email))?;
            println!("{:?}", member);
        }
        MemberCommand::Delete { id } => store.delete_member(MemberId(id))?,
    }
    Ok(())
}

/// Print the outcome and map its status to an exit code
fn lending_exit(result: Result<(), LendingError>, success: &str) -> ExitCode {
    match result {
        Ok(()) => {
            println!("{}", success);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            match e.status_code() {
                400 => ExitCode::from(2),
                404 => ExitCode::from(3),
                409 => ExitCode::from(4),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn verify_wal(data_dir: &std::path::Path) -> ExitCode {
    let wal_path = data_dir.join("wal.log");
    if !wal_path.exists() {
        println!("No WAL at {}", wal_path.display());
        return ExitCode::SUCCESS;
    }
    match WalRecovery::verify(&wal_path) {
        Ok(result) => {
            println!(
                "{} valid entries, {} corrupted, last_lsn={}, partial tail={}",
                result.entries_recovered,
                result.entries_corrupted,
                result.last_lsn,
                result.was_truncated
            );
            if result.entries_corrupted > 0 || result.was_truncated {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
