use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::models::{MerchantEntry, ShopRow};

/// Category given to merchants missing from the lookup table.
pub(crate) const DEFAULT_CATEGORY: &str = "otros";

/// Outcome of classifying a merchant code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Resolution {
    /// Display name, or the raw code (possibly absent) when unknown.
    pub(crate) name: Option<String>,
    pub(crate) category: String,
}

/// Source of the user-maintained shops table.
pub(crate) trait ShopTable {
    fn shop_rows(&self) -> Result<Vec<ShopRow>>;
}

/// Merchant code -> classification, fixed for the duration of a run.
pub(crate) struct Classifier {
    lookup: HashMap<String, MerchantEntry>,
    default_category: String,
}

impl Classifier {
    pub(crate) fn new(lookup: HashMap<String, MerchantEntry>, default_category: &str) -> Self {
        Self {
            lookup,
            default_category: default_category.to_string(),
        }
    }

    /// Build the lookup from shop rows, dropping rows with an empty category.
    /// When a code repeats, the later row wins.
    pub(crate) fn from_rows(rows: Vec<ShopRow>, default_category: &str) -> Self {
        let lookup = rows
            .into_iter()
            .filter(|row| !row.category.is_empty())
            .map(ShopRow::into_entry)
            .collect();
        Self::new(lookup, default_category)
    }

    pub(crate) fn load(table: &dyn ShopTable, default_category: &str) -> Result<Self> {
        let rows = table.shop_rows().context("Failed to read shops table")?;
        Ok(Self::from_rows(rows, default_category))
    }

    pub(crate) fn len(&self) -> usize {
        self.lookup.len()
    }

    pub(crate) fn resolve(&self, code: Option<&str>) -> Resolution {
        match code.and_then(|c| self.lookup.get(c)) {
            Some(entry) => Resolution {
                name: Some(entry.display_name.clone()),
                category: entry.category.clone(),
            },
            None => Resolution {
                name: code.map(str::to_string),
                category: self.default_category.clone(),
            },
        }
    }
}
