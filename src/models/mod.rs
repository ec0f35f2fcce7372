mod extracted;
mod merchant;
mod message;
mod resolved;

pub use extracted::ExtractedTransaction;
pub use merchant::{MerchantEntry, ShopRow};
pub use message::MailMessage;
pub use resolved::ResolvedTransaction;
