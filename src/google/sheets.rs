use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::{check_status, GoogleError};
use crate::categorize::ShopTable;
use crate::ledger::Ledger;
use crate::models::ShopRow;

pub(crate) const SHEETS_API: &str = "https://sheets.googleapis.com/v4";

/// Spreadsheet id from a `https://docs.google.com/spreadsheets/d/<id>/edit...` URL.
pub(crate) fn spreadsheet_id_from_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url).with_context(|| format!("Invalid spreadsheet URL: {url}"))?;
    let mut segments = parsed
        .path_segments()
        .with_context(|| format!("Spreadsheet URL has no path: {url}"))?;
    while let Some(segment) = segments.next() {
        if segment == "d" {
            if let Some(id) = segments.next().filter(|id| !id.is_empty()) {
                return Ok(id.to_string());
            }
        }
    }
    anyhow::bail!("No spreadsheet id in URL: {url}")
}

/// A1-notation range covering a whole worksheet.
pub(crate) fn sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Header row -> one record per following row, padding short rows with "".
pub(crate) fn records_from_values(values: Vec<Vec<String>>) -> Vec<HashMap<String, String>> {
    let mut rows = values.into_iter();
    let Some(headers) = rows.next() else {
        return Vec::new();
    };
    rows.map(|row| {
        headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.clone(), row.get(i).cloned().unwrap_or_default()))
            .collect()
    })
    .collect()
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Client bound to one spreadsheet.
pub(crate) struct SheetsClient {
    http: Client,
    access_token: String,
    base: String,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub(crate) fn open_by_url(http: Client, access_token: String, url: &str) -> Result<Self> {
        Ok(Self {
            http,
            access_token,
            base: SHEETS_API.to_string(),
            spreadsheet_id: spreadsheet_id_from_url(url)?,
        })
    }

    pub(crate) fn worksheet(&self, title: &str) -> Worksheet<'_> {
        Worksheet {
            client: self,
            title: title.to_string(),
        }
    }

    fn values_url(&self, range: &str) -> Result<Url, GoogleError> {
        let mut url = Url::parse(&self.base)
            .map_err(|e| GoogleError::Malformed(format!("bad Sheets base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| GoogleError::Malformed("Sheets base URL cannot have a path".into()))?
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }
}

/// One tab of the spreadsheet.
pub(crate) struct Worksheet<'a> {
    client: &'a SheetsClient,
    title: String,
}

impl Worksheet<'_> {
    /// Every row below the header as a header -> cell map.
    pub(crate) fn get_all_records(&self) -> Result<Vec<HashMap<String, String>>, GoogleError> {
        let url = self.client.values_url(&sheet_range(&self.title))?;
        let response = self
            .client
            .http
            .get(url)
            .bearer_auth(&self.client.access_token)
            .send()?;
        let range: ValueRange = check_status("Sheets", response)?.json()?;
        Ok(records_from_values(range.values))
    }

    /// Add `row` after the last row of the table.
    pub(crate) fn append_row(&self, row: &[String]) -> Result<(), GoogleError> {
        let range = format!("{}:append", sheet_range(&self.title));
        let url = self.client.values_url(&range)?;
        let body = ValueRange {
            values: vec![row.to_vec()],
        };
        let response = self
            .client
            .http
            .post(url)
            .bearer_auth(&self.client.access_token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&body)
            .send()?;
        check_status("Sheets", response)?;
        Ok(())
    }
}

impl ShopTable for Worksheet<'_> {
    fn shop_rows(&self) -> Result<Vec<ShopRow>> {
        let records = self
            .get_all_records()
            .with_context(|| format!("Failed to read worksheet '{}'", self.title))?;
        Ok(records.iter().filter_map(ShopRow::from_record).collect())
    }
}

impl Ledger for Worksheet<'_> {
    fn append_row(&mut self, row: &[String]) -> Result<()> {
        Worksheet::append_row(self, row)
            .with_context(|| format!("Failed to append to worksheet '{}'", self.title))
    }
}

#[cfg(test)]
#[path = "sheets_tests.rs"]
mod tests;
