use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use pocket_ledger::{
    BudgetFields, BudgetPeriod, MonthYear, PasswordHash, Transaction, TransactionType,
    create_budget, create_transaction, create_user, initialize_db,
};

/// A utility for creating a test database for the JSON API server of pocket_ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// The number of months of sample transactions, including the current month.
const SAMPLE_MONTHS: u32 = 4;

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

    println!("Creating test user...");

    let password_hash = PasswordHash::new("test", bcrypt::DEFAULT_COST)?;
    let user = create_user("Demo", "demo@example.com", password_hash, &conn)?;

    println!("Creating sample transactions...");

    let this_month = MonthYear::from_date(OffsetDateTime::now_utc().date());

    for offset in 0..SAMPLE_MONTHS {
        let month = this_month.minus_months(offset);
        let first_day = month.first_day();
        let scale = f64::from(offset + 1);

        let samples = [
            (4200.0, TransactionType::Income, "Salary", "Monthly pay", 0),
            (1600.0, TransactionType::Expense, "Rent", "Rent", 1),
            (85.5 * scale, TransactionType::Expense, "Groceries", "Supermarket", 3),
            (42.0, TransactionType::Expense, "Transport", "Bus pass", 5),
            (23.9 * scale, TransactionType::Expense, "Eating Out", "", 9),
            (150.0, TransactionType::Income, "Freelance", "Logo design", 12),
            (61.25, TransactionType::Expense, "Groceries", "Market", 14),
        ];

        for (amount, transaction_type, category, description, day_offset) in samples {
            let date = first_day + Duration::days(day_offset);
            if date > month.last_day() {
                continue;
            }

            create_transaction(
                user.id,
                Transaction::build(amount, transaction_type, category, date)
                    .description(Some(description.to_owned())),
                &conn,
            )?;
        }
    }

    println!("Creating budgets for {this_month}...");

    for (category, amount) in [("Groceries", 400.0), ("Rent", 1600.0), ("Eating Out", 100.0)] {
        create_budget(
            user.id,
            this_month,
            BudgetFields {
                category: category.to_owned(),
                amount,
                period: BudgetPeriod::Monthly,
            },
            &conn,
        )?;
    }

    println!("Success! Log in with demo@example.com and the password \"test\".");

    Ok(())
}
