mod cli;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use reqwest::blocking::Client;

use crate::categorize::{Classifier, ShopTable};
use crate::collect::{Collector, MailQuery, MailSource};
use crate::config::Config;
use crate::extract::Extractor;
use crate::google::{
    FileCredentialStore, GmailClient, ServiceAccountKey, SheetsClient, UserAuth,
    GMAIL_READONLY_SCOPE, SPREADSHEETS_SCOPE,
};
use crate::ledger::{self, CsvLedger, Ledger};
use crate::models::{ExtractedTransaction, ResolvedTransaction};

pub(crate) use cli::as_cli;

/// Format of the timestamp inside the notification text.
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

const USER_SCOPES: &[&str] = &[GMAIL_READONLY_SCOPE, SPREADSHEETS_SCOPE];
const SERVICE_SCOPES: &[&str] = &[SPREADSHEETS_SCOPE];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) collected: usize,
    pub(crate) written: usize,
    pub(crate) skipped: usize,
}

/// The day before `now`, as seen in the fixed `offset`.
pub(crate) fn target_date(now: DateTime<Utc>, offset: FixedOffset) -> Result<NaiveDate> {
    let today = now.with_timezone(&offset).date_naive();
    today
        .pred_opt()
        .with_context(|| format!("No day before {today}"))
}

/// Why an extracted record was not written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SkipReason {
    MissingShop,
    MissingTimestamp,
    InvalidTimestamp,
    MissingAmount,
}

impl SkipReason {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::MissingShop => "no shop name",
            Self::MissingTimestamp => "no timestamp",
            Self::InvalidTimestamp => "timestamp is not a valid date",
            Self::MissingAmount => "no amount",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Join an extracted record with its classification. Shop name, timestamp
/// and amount must all be present; the first one that is not is reported.
pub(crate) fn resolve(
    txn: &ExtractedTransaction,
    classifier: &Classifier,
) -> Result<ResolvedTransaction, SkipReason> {
    let resolution = classifier.resolve(txn.merchant_code.as_deref());
    let shop_name = resolution
        .name
        .filter(|n| !n.is_empty())
        .ok_or(SkipReason::MissingShop)?;

    let timestamp_text = txn
        .timestamp_text
        .as_deref()
        .filter(|ts| !ts.is_empty())
        .ok_or(SkipReason::MissingTimestamp)?;
    let timestamp = NaiveDateTime::parse_from_str(timestamp_text, TIMESTAMP_FORMAT)
        .map_err(|_| SkipReason::InvalidTimestamp)?;

    let amount = txn
        .amount_text
        .clone()
        .filter(|a| !a.is_empty())
        .ok_or(SkipReason::MissingAmount)?;

    Ok(ResolvedTransaction {
        shop_name,
        date: timestamp.date(),
        time: timestamp.time(),
        amount,
        category: resolution.category,
    })
}

/// Collect `date`'s notifications, classify them and write complete ones.
pub(crate) fn process_day(
    config: &Config,
    mail: &dyn MailSource,
    shops: &dyn ShopTable,
    expenses: &mut dyn Ledger,
    date: NaiveDate,
) -> Result<RunSummary> {
    let classifier = Classifier::load(shops, &config.default_category)?;
    tracing::info!(shops = classifier.len(), "Loaded shops table");

    let extractor = Extractor::charge_notification()?;
    let query = MailQuery::for_day(&config.sender, date, config.utc_offset)?;
    let extracted = Collector::new(&extractor, &config.subject).collect(mail, &query)?;

    let mut summary = RunSummary {
        collected: extracted.len(),
        ..RunSummary::default()
    };
    for txn in &extracted {
        let resolved = match resolve(txn, &classifier) {
            Ok(resolved) => resolved,
            Err(reason) => {
                tracing::info!(
                    merchant = ?txn.merchant_code,
                    timestamp = ?txn.timestamp_text,
                    amount = ?txn.amount_text,
                    %reason,
                    "Skipping incomplete transaction"
                );
                summary.skipped += 1;
                continue;
            }
        };

        ledger::append_resolved(expenses, &resolved)?;
        tracing::info!(
            shop = %resolved.shop_name,
            date = %resolved.date,
            time = %resolved.time,
            amount = %resolved.amount,
            category = %resolved.category,
            "Recorded expense"
        );
        summary.written += 1;
    }

    Ok(summary)
}

/// A full scheduled run: authenticate, then process yesterday.
pub(crate) fn once() -> Result<()> {
    let config = Config::from_env()?;
    let http = Client::builder()
        .user_agent(concat!("mibilletera/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let store = FileCredentialStore::new(&config.token_cache);
    let user_token = UserAuth::new(
        &http,
        &store,
        &config.client_secrets,
        config.oauth_port,
        USER_SCOPES,
    )
    .access_token()
    .context("Gmail authentication failed")?;
    let gmail = GmailClient::new(http.clone(), user_token);

    let service_token = ServiceAccountKey::from_file(&config.service_account)?
        .access_token(&http, SERVICE_SCOPES)
        .context("Sheets authentication failed")?;
    let sheets = SheetsClient::open_by_url(http, service_token, &config.sheet_url)?;
    let shops = sheets.worksheet(&config.shops_sheet);

    let date = target_date(Utc::now(), config.utc_offset)?;
    tracing::info!(%date, offset = %config.utc_offset, "Processing notifications");

    let summary = match &config.ledger_csv {
        Some(path) => {
            tracing::info!(path = %path.display(), "Writing to local CSV ledger");
            let mut ledger = CsvLedger::new(path);
            process_day(&config, &gmail, &shops, &mut ledger, date)?
        }
        None => {
            let mut ledger = sheets.worksheet(&config.expenses_sheet);
            process_day(&config, &gmail, &shops, &mut ledger, date)?
        }
    };

    tracing::info!(
        collected = summary.collected,
        written = summary.written,
        skipped = summary.skipped,
        "Run complete"
    );
    Ok(())
}
