//! Gmail and Google Sheets collaborators over their REST APIs.
mod auth;
mod error;
mod gmail;
mod sheets;

pub(crate) use auth::{
    FileCredentialStore, ServiceAccountKey, UserAuth, GMAIL_READONLY_SCOPE, SPREADSHEETS_SCOPE,
};
#[cfg(test)]
pub(crate) use auth::{CredentialStore, StoredToken};
pub(crate) use gmail::GmailClient;
pub(crate) use sheets::SheetsClient;
