//! Trip members, expenses and transfers, plus their CSV record forms.

use crate::error::{Result, SettleError};
use crate::money::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub type MemberId = String;

/// A trip member. Referenced everywhere else by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub email: String,
}

impl Member {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Member {
            id: id.into(),
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A shared expense paid by one member and split evenly between others.
///
/// # Invariants
///
/// - `amount` is strictly positive
/// - `split_ids` holds at least one member id; the payer may or may not be in it
///
/// Both are checked by [`Expense::validate`], which the pipeline calls
/// before touching any balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub payer_id: MemberId,
    pub split_ids: Vec<MemberId>,
    pub is_settled: bool,
    pub date: DateTime<Utc>,
}

impl Expense {
    /// Checks amount and split set.
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(SettleError::NonPositiveAmount {
                expense_id: self.id.clone(),
                amount: self.amount.to_string(),
            });
        }
        if self.split_ids.is_empty() {
            return Err(SettleError::EmptySplitSet {
                expense_id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Distinct splitter ids, in first-seen order.
    pub fn splitters(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.split_ids.len());
        for id in &self.split_ids {
            if !seen.contains(&id.as_str()) {
                seen.push(id.as_str());
            }
        }
        seen
    }
}

/// A single debtor-to-creditor payment in ledger currency.
///
/// Identity for persistence is the `(from, to)` pair, see [`crate::flags::pair_key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Decimal,
    pub is_settled: bool,
}

/// Raw expense row as read from `expenses.csv`.
///
/// `splits` is a `;`-separated list of member ids.
#[derive(Debug, Deserialize)]
pub struct ExpenseRecord {
    pub id: String,
    pub description: String,
    pub amount: String,
    pub currency: String,
    pub payer: String,
    pub splits: String,
    pub settled: Option<bool>,
    pub date: String,
}

impl ExpenseRecord {
    /// Parses the raw CSV record into a validated [`Expense`].
    pub fn parse(&self) -> Result<Expense> {
        let amount = Decimal::from_str(self.amount.trim()).map_err(|e| invalid(&self.id, e))?;
        let currency = Currency::from_str(&self.currency)?;
        let date = DateTime::parse_from_rfc3339(self.date.trim())
            .map_err(|e| invalid(&self.id, e))?
            .with_timezone(&Utc);
        let split_ids = self
            .splits
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let expense = Expense {
            id: self.id.trim().to_string(),
            description: self.description.trim().to_string(),
            amount,
            currency,
            payer_id: self.payer.trim().to_string(),
            split_ids,
            is_settled: self.settled.unwrap_or(false),
            date,
        };
        expense.validate()?;
        Ok(expense)
    }
}

fn invalid(expense_id: &str, err: impl std::fmt::Display) -> SettleError {
    SettleError::InvalidRecord {
        row: 0,
        message: format!("expense {}: {}", expense_id.trim(), err),
    }
}

/// Persisted settlement flag row as read from `settlements.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SettlementFlagRecord {
    pub from: String,
    pub to: String,
    pub settled: bool,
}
