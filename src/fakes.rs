//! In-memory collaborators for unit tests.
#![allow(clippy::unwrap_used)]

use anyhow::{anyhow, Result};
use std::cell::RefCell;

use crate::categorize::ShopTable;
use crate::collect::{MailQuery, MailSource};
use crate::ledger::Ledger;
use crate::models::{MailMessage, ShopRow};

#[derive(Default)]
pub(crate) struct FakeMailbox {
    ids: Vec<String>,
    messages: Vec<MailMessage>,
    queries: RefCell<Vec<MailQuery>>,
}

impl FakeMailbox {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_message(mut self, id: &str, subject: Option<&str>, snippet: &str) -> Self {
        self.ids.push(id.to_string());
        self.messages.push(MailMessage {
            id: id.to_string(),
            subject: subject.map(str::to_string),
            snippet: snippet.to_string(),
        });
        self
    }

    /// An id returned by search that cannot be fetched.
    pub(crate) fn with_missing(mut self, id: &str) -> Self {
        self.ids.push(id.to_string());
        self
    }

    pub(crate) fn queries(&self) -> Vec<MailQuery> {
        self.queries.borrow().clone()
    }
}

impl MailSource for FakeMailbox {
    fn search(&self, query: &MailQuery) -> Result<Vec<String>> {
        self.queries.borrow_mut().push(query.clone());
        Ok(self.ids.clone())
    }

    fn fetch(&self, id: &str) -> Result<MailMessage> {
        self.messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("message {id} not found"))
    }
}

pub(crate) struct FakeShopTable {
    rows: Vec<ShopRow>,
}

impl FakeShopTable {
    pub(crate) fn new(rows: Vec<ShopRow>) -> Self {
        Self { rows }
    }
}

impl ShopTable for FakeShopTable {
    fn shop_rows(&self) -> Result<Vec<ShopRow>> {
        Ok(self.rows.clone())
    }
}

#[derive(Default)]
pub(crate) struct MemoryLedger {
    pub(crate) rows: Vec<Vec<String>>,
    fail: bool,
}

impl MemoryLedger {
    pub(crate) fn failing() -> Self {
        Self {
            rows: Vec::new(),
            fail: true,
        }
    }
}

impl Ledger for MemoryLedger {
    fn append_row(&mut self, row: &[String]) -> Result<()> {
        if self.fail {
            return Err(anyhow!("ledger unavailable"));
        }
        self.rows.push(row.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryCredentialStore {
    token: RefCell<Option<crate::google::StoredToken>>,
    saves: RefCell<usize>,
}

impl MemoryCredentialStore {
    pub(crate) fn with_token(token: crate::google::StoredToken) -> Self {
        Self {
            token: RefCell::new(Some(token)),
            saves: RefCell::new(0),
        }
    }

    pub(crate) fn saves(&self) -> usize {
        *self.saves.borrow()
    }
}

impl crate::google::CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<crate::google::StoredToken>> {
        Ok(self.token.borrow().clone())
    }

    fn save(&self, token: &crate::google::StoredToken) -> Result<()> {
        *self.token.borrow_mut() = Some(token.clone());
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}
