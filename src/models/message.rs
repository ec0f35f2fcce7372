/// A fetched mailbox message, reduced to the parts the collector reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub id: String,
    pub subject: Option<String>,
    /// Short preview text supplied by the mail service.
    pub snippet: String,
}
