mod patterns;

use anyhow::Result;

use crate::models::ExtractedTransaction;
use patterns::{CompiledPattern, Field, PatternSpec, CHARGE_NOTIFICATION};

/// Pulls merchant, timestamp and amount out of a notification body.
pub(crate) struct Extractor {
    patterns: Vec<CompiledPattern>,
}

impl Extractor {
    pub(crate) fn new(specs: &[PatternSpec]) -> Result<Self> {
        let patterns = specs
            .iter()
            .map(CompiledPattern::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Extractor for the bank's "Cargo en Cuenta" notifications.
    pub(crate) fn charge_notification() -> Result<Self> {
        Self::new(CHARGE_NOTIFICATION)
    }

    pub(crate) fn extract(&self, body: &str) -> ExtractedTransaction {
        let mut txn = ExtractedTransaction::default();
        for pattern in &self.patterns {
            let value = pattern.find(body);
            let slot = match pattern.field {
                Field::Merchant => &mut txn.merchant_code,
                Field::Timestamp => &mut txn.timestamp_text,
                Field::Amount => &mut txn.amount_text,
            };
            // Earlier patterns for the same field take precedence.
            if slot.is_none() {
                *slot = value;
            }
        }
        txn
    }
}
