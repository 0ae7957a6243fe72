//! Trip Settle CLI
//!
//! Reads trip members, expenses and optional persisted settlement flags
//! from CSV and prints the transfers that clear every balance.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- members.csv expenses.csv [settlements.csv] > transfers.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `EXCHANGERATE_API_KEY`: Enables the live JPY rate; without it the default rate is used
//! - `EXCHANGERATE_API_BASE_URL`, `EXCHANGERATE_TIMEOUT_SECS`: Rate source overrides

use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;
use trip_settle::engine::{load_expenses, load_flags, load_members, write_transfers};
use trip_settle::rate::rate_or_default;
use trip_settle::{
    MemoryFlagStore, RateProvider, RateSourceConfig, Result, SettleError, SettlementBoard,
    SettlementFlagStore,
};

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(SettleError::MissingArgument);
    }

    let members = load_members(BufReader::new(File::open(&args[1])?))?;
    let expenses = load_expenses(BufReader::new(File::open(&args[2])?))?;
    let store = MemoryFlagStore::new();
    if let Some(path) = args.get(3) {
        for record in load_flags(BufReader::new(File::open(path)?))? {
            store
                .set_flag(&record.from, &record.to, record.settled)
                .await?;
        }
    }

    let rate = rate_or_default(RateProvider::new(RateSourceConfig::from_env())).await;
    if rate.is_fallback() {
        eprintln!(
            "Exchange rate: 1 JPY = {} NTD (estimate, default rate)",
            rate.value()
        );
    } else {
        eprintln!("Exchange rate: 1 JPY = {} NTD (live)", rate.value());
    }

    let mut board = SettlementBoard::new();
    board.set_members(members)?;
    board.set_flags(store.get_all().await?)?;
    board.set_rate(rate)?;
    let settlement = board.set_expenses(expenses)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    write_transfers(&settlement.transfers, handle)?;

    Ok(())
}
