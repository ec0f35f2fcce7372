mod csv_ledger;

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};

use crate::models::ResolvedTransaction;

pub(crate) use csv_ledger::CsvLedger;

/// Column order of the expenses table.
pub(crate) const LEDGER_HEADER: [&str; 5] = ["shop", "date", "time", "amount", "category"];

/// Append-only destination for expense rows.
pub(crate) trait Ledger {
    /// Add `row` after the last existing row.
    fn append_row(&mut self, row: &[String]) -> Result<()>;
}

/// Format and append one expense row. Never checks for existing rows.
pub(crate) fn append(
    ledger: &mut dyn Ledger,
    shop_name: &str,
    date: NaiveDate,
    time: NaiveTime,
    amount: &str,
    category: &str,
) -> Result<()> {
    let row = [
        shop_name.to_string(),
        date.format("%Y-%m-%d").to_string(),
        time.format("%H:%M:%S").to_string(),
        amount.to_string(),
        category.to_string(),
    ];
    ledger.append_row(&row)
}

pub(crate) fn append_resolved(ledger: &mut dyn Ledger, txn: &ResolvedTransaction) -> Result<()> {
    append(
        ledger,
        &txn.shop_name,
        txn.date,
        txn.time,
        &txn.amount,
        &txn.category,
    )
}
