use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use budget_api::{MonthKey, Transaction, UserId, create_transaction, initialize_db, upsert_user};

/// A utility for creating a test database for the REST API server of budget_api.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The `sub` claim of the test user's tokens.
    #[arg(long, default_value = "test-user")]
    user_id: String,

    /// How many months of transactions to create, ending with the current month.
    #[arg(long, default_value_t = 6)]
    months: u32,
}

/// `(day of month, description, amount, category)` for each month.
const MONTHLY_TRANSACTIONS: &[(u8, &str, f64, &str)] = &[
    (1, "ACME Corp Payroll", 4200.0, "Salary"),
    (1, "Rent", -1650.0, "Rent"),
    (3, "Whole Foods Market", -132.45, "Groceries"),
    (5, "Electric Company", -88.2, "Electricity"),
    (8, "Starbucks", -6.75, "Cafes"),
    (12, "Uber Trip", -23.4, "Taxi Service"),
    (15, "Netflix", -15.49, "Streaming Services"),
    (18, "Transfer to Savings", -500.0, "Transfer"),
    (21, "Trader Joe's", -76.3, "Groceries"),
    (26, "Corner Bakery", -9.5, "Uncategorized"),
];

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

    println!("Creating test user '{}'...", args.user_id);
    let user_id = UserId::new(&args.user_id);
    upsert_user(&user_id, Some("test@example.com"), Some("Test User"), &conn)?;

    println!("Creating {} months of transactions...", args.months);
    let today = OffsetDateTime::now_utc().date();
    let mut count = 0;

    for month in MonthKey::of(today).window_ending_here(args.months) {
        for &(day, description, amount, category) in MONTHLY_TRANSACTIONS {
            let date = month.first_day()? + Duration::days(i64::from(day) - 1);
            if date > today {
                continue;
            }

            let builder = Transaction::build(amount, date, description).category(category);
            create_transaction(&user_id, builder, &conn)?;
            count += 1;
        }
    }

    println!("Created {count} transactions.");
    println!("Success!");

    Ok(())
}
