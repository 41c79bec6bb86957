use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use rusqlite::Connection;
use time::OffsetDateTime;

use finboard::{
    AccountType, PasswordHash, ValidatedPassword, connect_external_account, create_user,
    initialize_db,
};

/// A utility for creating a test database for the finboard server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

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

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user("demo@example.com", "Demo User", password_hash, &conn)?;

    println!("Connecting demo accounts...");

    let mut rng = StdRng::seed_from_u64(42);
    let today = OffsetDateTime::now_utc().date();

    for (kind, provider, name) in [
        (AccountType::Bank, "chase", "Total Checking"),
        (AccountType::Credit, "amex", "Gold Card"),
        (AccountType::Investment, "fidelity", "Brokerage Account"),
    ] {
        let account =
            connect_external_account(user.id, kind, provider, name, today, &mut rng, &conn)?;
        println!("  {name} ({provider}) balance {}", account.balance);
    }

    println!("Success! Log in as demo@example.com with the password 'test'.");

    Ok(())
}
