use chrono::{NaiveDate, NaiveTime};

/// The unit persisted to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTransaction {
    pub shop_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Digit string, no separators.
    pub amount: String,
    pub category: String,
}
