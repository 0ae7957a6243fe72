//! Debt netting: turns signed balances into debtor-to-creditor transfers.

use crate::balance::Balances;
use crate::model::{MemberId, Transfer};
use log::debug;
use rust_decimal::Decimal;

/// Outstanding magnitude of one side of the netting.
#[derive(Clone, Debug)]
struct PersonalBalance {
    id: MemberId,
    remaining: Decimal,
}

/// Greedily matches debtors against creditors.
///
/// Creditors (balance > 0) and debtors (balance < 0) keep the order of the
/// balance map, i.e. member-list order. Two pointers walk both lists; each
/// step settles `min(creditor, debtor)` and advances whichever side reached
/// exactly zero. Zero balances never produce a transfer. Matching stops as
/// soon as either side runs out, so rounding drift left over on the other
/// side is dropped.
///
/// This emits at most `creditors + debtors - 1` transfers. It is not always
/// the global minimum: balances that split into independent zero-sum groups
/// can need fewer.
pub fn net_balances(balances: &Balances) -> Vec<Transfer> {
    let mut creditors = Vec::new();
    let mut debtors = Vec::new();

    for (id, balance) in balances.iter() {
        if balance > Decimal::ZERO {
            creditors.push(PersonalBalance {
                id: id.to_string(),
                remaining: balance,
            });
        } else if balance < Decimal::ZERO {
            debtors.push(PersonalBalance {
                id: id.to_string(),
                remaining: -balance,
            });
        }
    }

    let mut transfers = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < creditors.len() && j < debtors.len() {
        let creditor = &mut creditors[i];
        let debtor = &mut debtors[j];
        let amount = creditor.remaining.min(debtor.remaining);

        if amount > Decimal::ZERO {
            debug!("{} pays {} to {}", debtor.id, amount, creditor.id);
            transfers.push(Transfer {
                from: debtor.id.clone(),
                to: creditor.id.clone(),
                amount,
                is_settled: false,
            });
        }

        creditor.remaining -= amount;
        debtor.remaining -= amount;

        if creditor.remaining.is_zero() {
            i += 1;
        }
        if debtor.remaining.is_zero() {
            j += 1;
        }
    }

    transfers
}
