use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use super::{Ledger, LEDGER_HEADER};

/// Ledger backed by a local CSV file, used for dry runs.
pub(crate) struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub(crate) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Ledger for CsvLedger {
    fn append_row(&mut self, row: &[String]) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open ledger file: {}", self.path.display()))?;
        let is_new = file
            .metadata()
            .with_context(|| format!("Failed to stat ledger file: {}", self.path.display()))?
            .len()
            == 0;

        let mut wtr = csv::WriterBuilder::new().from_writer(file);
        if is_new {
            wtr.write_record(LEDGER_HEADER)
                .context("Failed to write ledger header")?;
        }
        wtr.write_record(row).context("Failed to write ledger row")?;
        wtr.flush().context("Failed to flush ledger file")?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "csv_ledger_tests.rs"]
mod tests;
