//! Aggregation of per-expense obligations into one signed balance per member.

use crate::error::{Result, SettleError};
use crate::model::{Expense, Member, MemberId};
use crate::obligation::compute_obligations;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Signed member balances in ledger units, kept in member-list order.
///
/// Positive means the member is owed money, negative means they owe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Balances {
    entries: Vec<(MemberId, Decimal)>,
    index: HashMap<MemberId, usize>,
}

impl Balances {
    /// Starts every member at zero. Later duplicates of an id are ignored.
    pub fn for_members(members: &[Member]) -> Self {
        let mut balances = Balances::default();
        for member in members {
            if balances.index.contains_key(&member.id) {
                warn!("Duplicate member id {}, ignoring", member.id);
                continue;
            }
            balances
                .index
                .insert(member.id.clone(), balances.entries.len());
            balances.entries.push((member.id.clone(), Decimal::ZERO));
        }
        balances
    }

    pub fn get(&self, member_id: &str) -> Option<Decimal> {
        self.index.get(member_id).map(|&i| self.entries[i].1)
    }

    /// Iterates `(member, balance)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.entries.iter().map(|(id, amount)| (id.as_str(), *amount))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every balance: the accumulated net effect of all expenses.
    ///
    /// `None` if the sum leaves the decimal range.
    pub fn total(&self) -> Option<Decimal> {
        self.entries
            .iter()
            .try_fold(Decimal::ZERO, |acc, (_, amount)| acc.checked_add(*amount))
    }

    fn adjust(&mut self, expense_id: &str, member_id: &str, delta: Decimal) -> Result<()> {
        let slot = *self
            .index
            .get(member_id)
            .ok_or_else(|| SettleError::UnknownMember {
                expense_id: expense_id.to_string(),
                member_id: member_id.to_string(),
            })?;
        let entry = &mut self.entries[slot].1;
        *entry = entry
            .checked_add(delta)
            .ok_or_else(|| SettleError::AmountOverflow {
                expense_id: expense_id.to_string(),
            })?;
        Ok(())
    }
}

/// Builds balances from ready-made entries. Later duplicates of an id are ignored.
impl FromIterator<(MemberId, Decimal)> for Balances {
    fn from_iter<I: IntoIterator<Item = (MemberId, Decimal)>>(iter: I) -> Self {
        let mut balances = Balances::default();
        for (id, amount) in iter {
            if balances.index.contains_key(&id) {
                warn!("Duplicate balance entry {}, ignoring", id);
                continue;
            }
            balances.index.insert(id.clone(), balances.entries.len());
            balances.entries.push((id, amount));
        }
        balances
    }
}

/// Sums the obligations of every unsettled expense into member balances.
///
/// Settled expenses contribute nothing. Every expense is validated first and
/// every referenced member must be known.
pub fn aggregate(expenses: &[Expense], members: &[Member], rate: Decimal) -> Result<Balances> {
    let mut balances = Balances::for_members(members);

    for expense in expenses.iter().filter(|e| !e.is_settled) {
        expense.validate()?;
        let obligations = compute_obligations(expense, rate)?;

        balances.adjust(&expense.id, &expense.payer_id, obligations.payer_credit)?;
        for (member_id, debit) in &obligations.per_splitter_debit {
            balances.adjust(&expense.id, member_id, -*debit)?;
        }

        debug!(
            "Expense {}: total {} share {} credited to {}",
            expense.id, obligations.total, obligations.per_person_share, expense.payer_id
        );
    }

    Ok(balances)
}
