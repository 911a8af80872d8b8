use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use finance_tracker::{
    NewTransaction, PasswordHash, TransactionType, ValidatedPassword, create_transaction,
    create_user, initialize_db,
};

/// A utility for creating a test database for the REST API server of finance_tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const TEST_EMAIL: &str = "test@example.com";
const TEST_PASSWORD: &str = "test";

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user {TEST_EMAIL} with password \"{TEST_PASSWORD}\"...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user("Test User", TEST_EMAIL, password_hash, &conn)?;

    println!("Creating sample transactions...");

    let today = OffsetDateTime::now_utc().date();
    let samples = [
        ("Salary", 4200.0, TransactionType::Income, 0, Some("PAY-001")),
        ("Rent", 1800.0, TransactionType::Expense, 1, Some("Lease 12B")),
        ("Groceries", 145.3, TransactionType::Expense, 3, None),
        ("Coffee", 4.5, TransactionType::Expense, 4, None),
        ("Groceries", 98.75, TransactionType::Expense, 10, None),
        ("Freelance", 650.0, TransactionType::Income, 21, Some("INV-2024-17")),
        ("Power", 120.0, TransactionType::Expense, 33, None),
        ("Salary", 4200.0, TransactionType::Income, 31, Some("PAY-000")),
        ("Rent", 1800.0, TransactionType::Expense, 32, Some("Lease 12B")),
    ];

    for (title, amount, kind, days_ago, reference) in samples {
        let mut new_transaction =
            NewTransaction::new(title, amount, kind, today - Duration::days(days_ago));
        if let Some(reference) = reference {
            new_transaction = new_transaction.reference(reference);
        }

        create_transaction(user.id, new_transaction, &conn)?;
    }

    println!("Success!");

    Ok(())
}
