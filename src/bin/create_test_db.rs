use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};
use tracing_subscriber::EnvFilter;

use quick_expenses_rs::{AppState, SortOrder, Transaction, compute_totals, format};

/// A utility for creating a test database for the quick expenses app.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

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
    let state = AppState::new(conn).await?;

    println!("Creating sample transactions...");
    let now = OffsetDateTime::now_utc();
    let samples = [
        ("Salary", 4200.0, "Monthly pay", 30),
        ("Rent", -1200.0, "", 27),
        ("Groceries", -84.35, "Weekly shop", 6),
        ("Coffee", -4.5, "", 2),
        ("Refund", 19.99, "Returned headphones", 1),
    ];

    for (label, amount, description, days_ago) in samples {
        state
            .transactions
            .insert(
                Transaction::build(label, amount)
                    .description(description)
                    .date(now - Duration::days(days_ago)),
            )
            .await?;
    }

    let order = SortOrder::from_ascending(state.sort_preference.get());
    let mut feed = state.transactions.list_all(order);
    let Some(transactions) = feed.next().await else {
        return Ok(());
    };
    let transactions = transactions?;

    println!("Seeded {} transactions:", transactions.len());
    for transaction in &transactions {
        println!(
            "  {} | {} | {}",
            format::long_date(transaction.date)?,
            transaction.label,
            format::currency(transaction.amount),
        );
    }

    let totals = compute_totals(&transactions);
    println!(
        "Balance: {} | Budget: {} | Expense: {}",
        format::currency(totals.total),
        format::currency(totals.budget),
        format::currency(totals.expense),
    );

    println!("Success!");

    Ok(())
}
