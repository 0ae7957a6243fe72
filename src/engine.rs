//! The settlement pipeline and its recomputation board.
//!
//! `settle` is a pure function of expenses, members, rate and persisted
//! flags. [`SettlementBoard`] holds the latest copy of each input and re-runs
//! the pipeline whenever one of them is replaced, notifying listeners.

use crate::balance::aggregate;
use crate::error::{Result, SettleError};
use crate::flags::merge_settlement_flags;
use crate::model::{Expense, ExpenseRecord, Member, SettlementFlagRecord, Transfer};
use crate::netting::net_balances;
use crate::rate::ExchangeRate;
use csv::{ReaderBuilder, Trim};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::io::{Read, Write};

/// Runs the full pipeline: obligations, balances, netting, flag overlay.
///
/// Same inputs always give the same transfers in the same order.
pub fn settle(
    expenses: &[Expense],
    members: &[Member],
    rate: &ExchangeRate,
    flags: &HashMap<String, bool>,
) -> Result<Vec<Transfer>> {
    let balances = aggregate(expenses, members, rate.value())?;
    let transfers = net_balances(&balances);
    Ok(merge_settlement_flags(transfers, flags))
}

/// Output of one recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub transfers: Vec<Transfer>,
    pub rate: ExchangeRate,
}

type Listener = Box<dyn Fn(&Settlement) + Send + Sync>;

/// Latest inputs of the pipeline plus the listeners to notify on change.
///
/// Every setter replaces one input wholesale and recomputes from scratch.
/// A failed recompute returns the error and leaves listeners un-notified;
/// the new input is kept so a later fix to another input can succeed.
#[derive(Default)]
pub struct SettlementBoard {
    members: Vec<Member>,
    expenses: Vec<Expense>,
    rate: ExchangeRate,
    flags: HashMap<String, bool>,
    listeners: Vec<Listener>,
}

impl SettlementBoard {
    /// Creates an empty board using the fallback rate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback run after every successful recompute.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&Settlement) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn set_members(&mut self, members: Vec<Member>) -> Result<Settlement> {
        self.members = members;
        self.recompute()
    }

    pub fn set_expenses(&mut self, expenses: Vec<Expense>) -> Result<Settlement> {
        self.expenses = expenses;
        self.recompute()
    }

    pub fn set_rate(&mut self, rate: ExchangeRate) -> Result<Settlement> {
        self.rate = rate;
        self.recompute()
    }

    pub fn set_flags(&mut self, flags: HashMap<String, bool>) -> Result<Settlement> {
        self.flags = flags;
        self.recompute()
    }

    pub fn rate(&self) -> &ExchangeRate {
        &self.rate
    }

    /// Runs the pipeline over the current inputs and notifies listeners.
    pub fn recompute(&self) -> Result<Settlement> {
        let transfers = settle(&self.expenses, &self.members, &self.rate, &self.flags)?;
        let settlement = Settlement {
            transfers,
            rate: self.rate,
        };
        debug!(
            "Recomputed {} transfers for {} members",
            settlement.transfers.len(),
            self.members.len()
        );
        for listener in &self.listeners {
            listener(&settlement);
        }
        Ok(settlement)
    }
}

fn read_records<R, T>(reader: R) -> Result<Vec<(usize, T)>>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for (row_idx, result) in csv_reader.deserialize::<T>().enumerate() {
        let row = row_idx + 2; // 1-indexed, accounting for header row
        let record = result.map_err(|e| SettleError::InvalidRecord {
            row,
            message: e.to_string(),
        })?;
        records.push((row, record));
    }

    Ok(records)
}

/// Loads `id,name,email` rows.
pub fn load_members<R: Read>(reader: R) -> Result<Vec<Member>> {
    let members: Vec<Member> = read_records::<_, Member>(reader)?
        .into_iter()
        .map(|(_, m)| m)
        .collect();
    info!("Loaded {} members", members.len());
    Ok(members)
}

/// Loads and validates `id,description,amount,currency,payer,splits,settled,date` rows.
///
/// The first invalid row fails the whole load.
pub fn load_expenses<R: Read>(reader: R) -> Result<Vec<Expense>> {
    let expenses = read_records::<_, ExpenseRecord>(reader)?
        .into_iter()
        .map(|(row, record)| {
            record.parse().map_err(|e| SettleError::InvalidRecord {
                row,
                message: match e {
                    SettleError::InvalidRecord { message, .. } => message,
                    other => other.to_string(),
                },
            })
        })
        .collect::<Result<Vec<_>>>()?;
    info!("Loaded {} expenses", expenses.len());
    Ok(expenses)
}

/// Loads persisted `from,to,settled` rows in file order.
pub fn load_flags<R: Read>(reader: R) -> Result<Vec<SettlementFlagRecord>> {
    let records: Vec<SettlementFlagRecord> = read_records::<_, SettlementFlagRecord>(reader)?
        .into_iter()
        .map(|(_, r)| r)
        .collect();
    info!("Loaded {} settlement flags", records.len());
    Ok(records)
}

/// Writes transfers as `from,to,amount,settled` CSV, in netting order.
pub fn write_transfers<W: Write>(transfers: &[Transfer], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["from", "to", "amount", "settled"])?;
    for transfer in transfers {
        csv_writer.write_record([
            transfer.from.clone(),
            transfer.to.clone(),
            transfer.amount.normalize().to_string(),
            transfer.is_settled.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
