/// Fields pulled out of a single notification body.
///
/// Each field is independently optional: a pattern that does not match leaves
/// its field as `None`, which is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTransaction {
    pub merchant_code: Option<String>,
    /// Format: "DD/MM/YYYY HH:MM"
    pub timestamp_text: Option<String>,
    /// Digits only, thousands separators already stripped.
    pub amount_text: Option<String>,
}
