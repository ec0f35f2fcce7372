use anyhow::{Context, Result};
use chrono::FixedOffset;
use std::path::PathBuf;

use crate::categorize::DEFAULT_CATEGORY;
use crate::collect::CHARGE_SUBJECT;

const DEFAULT_SENDER: &str = "enviodigital@bancochile.cl";
const DEFAULT_SHOPS_SHEET: &str = "tiendas";
const DEFAULT_EXPENSES_SHEET: &str = "gastos";
/// Chile standard time.
const DEFAULT_UTC_OFFSET: &str = "-04:00";
const DEFAULT_CLIENT_SECRETS: &str = "credentials.json";
const DEFAULT_OAUTH_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) sheet_url: String,
    pub(crate) sender: String,
    pub(crate) subject: String,
    pub(crate) shops_sheet: String,
    pub(crate) expenses_sheet: String,
    pub(crate) default_category: String,
    /// Fixed timezone for "yesterday" and the mailbox day window.
    pub(crate) utc_offset: FixedOffset,
    pub(crate) client_secrets: PathBuf,
    pub(crate) token_cache: PathBuf,
    pub(crate) service_account: PathBuf,
    pub(crate) oauth_port: u16,
    /// Write rows to this CSV file instead of the expenses worksheet.
    pub(crate) ledger_csv: Option<PathBuf>,
}

impl Config {
    /// Load from the environment, after reading `.env` if one exists.
    pub(crate) fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        let token_cache = default_token_cache()?;
        Self::from_lookup(|key| std::env::var(key).ok(), token_cache)
    }

    pub(crate) fn from_lookup(
        get: impl Fn(&str) -> Option<String>,
        default_token_cache: PathBuf,
    ) -> Result<Self> {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| get(key).with_context(|| format!("{key} is required but not set"));

        let utc_offset = parse_utc_offset(&or("MIBILLETERA_UTC_OFFSET", DEFAULT_UTC_OFFSET))
            .context("Invalid MIBILLETERA_UTC_OFFSET")?;
        let oauth_port = match get("MIBILLETERA_OAUTH_PORT") {
            Some(port) => port
                .trim()
                .parse()
                .with_context(|| format!("Invalid MIBILLETERA_OAUTH_PORT: {port}"))?,
            None => DEFAULT_OAUTH_PORT,
        };

        Ok(Self {
            sheet_url: required("MIBILLETERA_SHEET_URL")?,
            sender: or("MIBILLETERA_SENDER", DEFAULT_SENDER),
            subject: or("MIBILLETERA_SUBJECT", CHARGE_SUBJECT),
            shops_sheet: or("MIBILLETERA_SHOPS_SHEET", DEFAULT_SHOPS_SHEET),
            expenses_sheet: or("MIBILLETERA_EXPENSES_SHEET", DEFAULT_EXPENSES_SHEET),
            default_category: or("MIBILLETERA_DEFAULT_CATEGORY", DEFAULT_CATEGORY),
            utc_offset,
            client_secrets: PathBuf::from(or("MIBILLETERA_CLIENT_SECRETS", DEFAULT_CLIENT_SECRETS)),
            token_cache: get("MIBILLETERA_TOKEN_CACHE")
                .map(PathBuf::from)
                .unwrap_or(default_token_cache),
            service_account: PathBuf::from(required("MIBILLETERA_SERVICE_ACCOUNT")?),
            oauth_port,
            ledger_csv: get("MIBILLETERA_LEDGER_CSV").map(PathBuf::from),
        })
    }
}

/// Parse `+HH:MM`, `-HH:MM`, `Z` or `UTC`.
pub(crate) fn parse_utc_offset(s: &str) -> Result<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).context("Zero offset out of range");
    }

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => anyhow::bail!("Offset must start with '+' or '-': {s}"),
    };
    let (hours, minutes) = rest
        .split_once(':')
        .with_context(|| format!("Offset must look like +HH:MM: {s}"))?;
    let hours: i32 = hours
        .parse()
        .with_context(|| format!("Invalid offset hours: {s}"))?;
    let minutes: i32 = minutes
        .parse()
        .with_context(|| format!("Invalid offset minutes: {s}"))?;
    if !(0..60).contains(&minutes) {
        anyhow::bail!("Offset minutes out of range: {s}");
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .with_context(|| format!("Offset out of range: {s}"))
}

fn default_token_cache() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("cl", "mibilletera", "mibilletera")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(proj_dirs.data_dir().join("token.json"))
}
