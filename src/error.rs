//! Error types for the settlement engine.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, SettleError>;

/// Errors that can occur while computing or persisting settlements.
#[derive(Error, Debug)]
pub enum SettleError {
    /// Currency code outside the two supported units
    #[error("Invalid currency '{0}': expected JPY or NTD")]
    InvalidCurrency(String),

    /// Expense with no splitters
    #[error("Expense {expense_id} has no splitters")]
    EmptySplitSet { expense_id: String },

    /// Expense amount that is zero or negative
    #[error("Expense {expense_id} has non-positive amount {amount}")]
    NonPositiveAmount { expense_id: String, amount: String },

    /// Payer or splitter that is not a trip member
    #[error("Expense {expense_id} references unknown member {member_id}")]
    UnknownMember {
        expense_id: String,
        member_id: String,
    },

    /// Ledger arithmetic left the representable decimal range
    #[error("Expense {expense_id} overflows the ledger amount range")]
    AmountOverflow { expense_id: String },

    /// Settlement flag upsert was rejected by the store
    #[error("Failed to write settlement flag {from}-{to}: {message}")]
    FlagWrite {
        from: String,
        to: String,
        message: String,
    },

    /// Failed to open or read an input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid input record
    #[error("Invalid record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Missing input file arguments
    #[error("Missing input file argument. Usage: trip-settle <members.csv> <expenses.csv> [settlements.csv]")]
    MissingArgument,
}

/// Reasons an exchange rate request did not produce a usable rate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateFetchError {
    #[error("missing EXCHANGERATE_API_KEY")]
    MissingApiKey,

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Http(u16),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
