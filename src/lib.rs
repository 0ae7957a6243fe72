//! # Trip Settle
//!
//! Settlement engine for shared trip expenses. Turns multi-currency,
//! multi-payer expense records into a short list of debtor-to-creditor
//! transfers that clears every balance.
//!
//! ## Pipeline
//!
//! - **Normalise**: foreign (JPY) amounts become ledger units (NTD) via a
//!   live or fallback rate, rounded half away from zero
//! - **Obligations**: each unsettled expense credits its payer and debits
//!   every other splitter one rounded share
//! - **Balances**: one signed amount per member, in member-list order
//! - **Netting**: greedy two-pointer matching of debtors against creditors
//! - **Flags**: persisted paid/unpaid state overlaid by `from-to` pair
//!
//! ## Example
//!
//! ```
//! use std::collections::HashMap;
//! use trip_settle::{settle, Currency, ExchangeRate, Expense, Member};
//! use rust_decimal::Decimal;
//!
//! let members = vec![
//!     Member::new("a", "Ann", "ann@example.com"),
//!     Member::new("b", "Bo", "bo@example.com"),
//! ];
//! let expenses = vec![Expense {
//!     id: "e1".into(),
//!     description: "sushi".into(),
//!     amount: Decimal::from(3000),
//!     currency: Currency::Jpy,
//!     payer_id: "a".into(),
//!     split_ids: vec!["a".into(), "b".into()],
//!     is_settled: false,
//!     date: chrono::Utc::now(),
//! }];
//!
//! let transfers = settle(&expenses, &members, &ExchangeRate::fallback(), &HashMap::new()).unwrap();
//! assert_eq!(transfers[0].from, "b");
//! assert_eq!(transfers[0].amount, Decimal::from(300));
//! ```

pub mod balance;
pub mod engine;
pub mod error;
pub mod flags;
pub mod model;
pub mod money;
pub mod netting;
pub mod obligation;
pub mod rate;

pub use balance::{aggregate, Balances};
pub use engine::{settle, Settlement, SettlementBoard};
pub use error::{RateFetchError, Result, SettleError};
pub use flags::{
    merge_settlement_flags, pair_key, toggle_settlement, MemoryFlagStore, SettlementFlagStore,
};
pub use model::{Expense, Member, MemberId, Transfer};
pub use money::{preview, to_ledger_amount, Currency, LEDGER_CURRENCY};
pub use netting::net_balances;
pub use obligation::{compute_obligations, Obligations};
pub use rate::{ExchangeRate, RateProvider, RateSource, RateSourceConfig, DEFAULT_RATE};
