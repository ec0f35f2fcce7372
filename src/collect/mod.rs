use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

use crate::extract::Extractor;
use crate::models::{ExtractedTransaction, MailMessage};

/// Subject of the bank's card charge notifications.
pub(crate) const CHARGE_SUBJECT: &str = "Cargo en Cuenta";

/// Messages from one sender received in `[after, before)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MailQuery {
    pub(crate) sender: String,
    pub(crate) after: DateTime<FixedOffset>,
    pub(crate) before: DateTime<FixedOffset>,
}

impl MailQuery {
    /// The calendar day `date` in the fixed `offset`, upper bound exclusive.
    pub(crate) fn for_day(sender: &str, date: NaiveDate, offset: FixedOffset) -> Result<Self> {
        let next = date
            .succ_opt()
            .with_context(|| format!("No day after {date}"))?;
        Ok(Self {
            sender: sender.to_string(),
            after: start_of_day(date, offset)?,
            before: start_of_day(next, offset)?,
        })
    }
}

fn start_of_day(date: NaiveDate, offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    date.and_time(NaiveTime::MIN)
        .and_local_timezone(offset)
        .single()
        .with_context(|| format!("Ambiguous start of day for {date}"))
}

/// Read-only search/get access to a mailbox.
pub(crate) trait MailSource {
    /// Message identifiers matching the query, in the service's native order.
    fn search(&self, query: &MailQuery) -> Result<Vec<String>>;

    fn fetch(&self, id: &str) -> Result<MailMessage>;
}

/// Finds charge notifications and runs the extractor over their snippets.
pub(crate) struct Collector<'a> {
    extractor: &'a Extractor,
    subject: &'a str,
}

impl<'a> Collector<'a> {
    pub(crate) fn new(extractor: &'a Extractor, subject: &'a str) -> Self {
        Self { extractor, subject }
    }

    pub(crate) fn collect(
        &self,
        source: &dyn MailSource,
        query: &MailQuery,
    ) -> Result<Vec<ExtractedTransaction>> {
        let ids = source
            .search(query)
            .with_context(|| format!("Mail search failed for sender {}", query.sender))?;
        tracing::info!(
            sender = %query.sender,
            after = %query.after,
            before = %query.before,
            found = ids.len(),
            "Searched mailbox"
        );

        let mut transactions = Vec::new();
        for id in &ids {
            let message = source
                .fetch(id)
                .with_context(|| format!("Failed to fetch message {id}"))?;

            if message.subject.as_deref() != Some(self.subject) {
                tracing::debug!(id = %message.id, subject = ?message.subject, "Skipping message");
                continue;
            }
            if message.snippet.is_empty() {
                tracing::debug!(id = %message.id, "Skipping message with empty snippet");
                continue;
            }

            transactions.push(self.extractor.extract(&message.snippet));
        }

        Ok(transactions)
    }
}
