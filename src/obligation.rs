//! Per-expense obligations: what the payer is owed and what each splitter owes.

use crate::error::{Result, SettleError};
use crate::model::{Expense, MemberId};
use crate::money::{round_ledger, to_ledger_amount};
use rust_decimal::Decimal;

/// The effect of one expense, in ledger units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Obligations {
    /// Expense total after conversion.
    pub total: Decimal,
    /// Rounded even share of one splitter.
    pub per_person_share: Decimal,
    /// Amount the payer is owed by the others.
    pub payer_credit: Decimal,
    /// Debt of every splitter other than the payer, in first-seen order.
    pub per_splitter_debit: Vec<(MemberId, Decimal)>,
}

impl Obligations {
    /// Difference left behind by rounding the share: `total - n * share`.
    ///
    /// Accepted as-is and never redistributed. Always `< n` units in magnitude.
    pub fn rounding_drift(&self, splitters: usize) -> Option<Decimal> {
        self.per_person_share
            .checked_mul(Decimal::from(splitters))
            .and_then(|shares| self.total.checked_sub(shares))
    }

    /// Payer credit minus every splitter debit: what this expense adds to the
    /// sum of all balances.
    ///
    /// Equals the rounding drift when the payer is a splitter. A payer outside
    /// the split set is still credited `total - share`, so the expense is
    /// short by one more share.
    pub fn net_effect(&self) -> Option<Decimal> {
        self.per_splitter_debit
            .iter()
            .try_fold(self.payer_credit, |acc, (_, debit)| acc.checked_sub(*debit))
    }
}

/// Computes the payer credit and splitter debits for a single expense.
///
/// The share is `round(total / n)` over the distinct splitters. The payer is
/// credited `total - share` whether or not they are in the split set, and
/// never owes themself.
pub fn compute_obligations(expense: &Expense, rate: Decimal) -> Result<Obligations> {
    let splitters = expense.splitters();
    if splitters.is_empty() {
        return Err(SettleError::EmptySplitSet {
            expense_id: expense.id.clone(),
        });
    }

    let overflow = || SettleError::AmountOverflow {
        expense_id: expense.id.clone(),
    };

    let total = to_ledger_amount(expense.amount, expense.currency, rate).ok_or_else(overflow)?;
    let per_person_share = total
        .checked_div(Decimal::from(splitters.len()))
        .map(round_ledger)
        .ok_or_else(overflow)?;
    let payer_credit = total.checked_sub(per_person_share).ok_or_else(overflow)?;

    let per_splitter_debit = splitters
        .into_iter()
        .filter(|id| *id != expense.payer_id)
        .map(|id| (id.to_string(), per_person_share))
        .collect();

    Ok(Obligations {
        total,
        per_person_share,
        payer_credit,
        per_splitter_debit,
    })
}
