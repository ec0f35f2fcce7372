use std::collections::HashMap;

/// Classification for a known merchant code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchantEntry {
    pub category: String,
    pub display_name: String,
}

impl MerchantEntry {
    pub fn new(category: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            display_name: display_name.into(),
        }
    }
}

/// One row of the shops worksheet, typed at the ingestion boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopRow {
    pub code: String,
    pub category: String,
    pub name: String,
}

impl ShopRow {
    const CODE_HEADERS: &'static [&'static str] = &["código", "codigo", "code"];
    const CATEGORY_HEADERS: &'static [&'static str] = &["categoría", "categoria", "category"];
    const NAME_HEADERS: &'static [&'static str] = &["nombre", "name"];

    /// Build a row from a header -> cell record. Header names are matched
    /// case-insensitively against the Spanish and English column names.
    /// Cell values are kept verbatim so codes compare exactly with the text
    /// extracted from notifications. Missing cells become empty strings; a
    /// record without any code column yields `None`.
    pub fn from_record(record: &HashMap<String, String>) -> Option<Self> {
        let code = lookup(record, Self::CODE_HEADERS)?;
        Some(Self {
            code: code.clone(),
            category: lookup(record, Self::CATEGORY_HEADERS)
                .cloned()
                .unwrap_or_default(),
            name: lookup(record, Self::NAME_HEADERS)
                .cloned()
                .unwrap_or_default(),
        })
    }

    pub fn into_entry(self) -> (String, MerchantEntry) {
        (self.code, MerchantEntry::new(self.category, self.name))
    }
}

/// Value of the first header in `names` (priority order) present in `record`.
fn lookup<'a>(record: &'a HashMap<String, String>, names: &[&str]) -> Option<&'a String> {
    names.iter().find_map(|name| {
        record
            .iter()
            .find(|(header, _)| header.trim().to_lowercase() == *name)
            .map(|(_, value)| value)
    })
}
