use anyhow::Result;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;

use super::error::{check_status, GoogleError};
use crate::collect::{MailQuery, MailSource};
use crate::models::MailMessage;

pub(crate) const GMAIL_API: &str = "https://gmail.googleapis.com/gmail/v1";

/// Gmail search syntax for a query. Epoch-second bounds keep the window
/// independent of the mailbox's timezone setting.
pub(crate) fn search_expression(query: &MailQuery) -> String {
    format!(
        "from:{} after:{} before:{}",
        query.sender,
        query.after.timestamp(),
        query.before.timestamp()
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageResponse {
    id: String,
    #[serde(default)]
    snippet: String,
    payload: Option<Payload>,
}

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    headers: Vec<MessageHeader>,
}

#[derive(Debug, Deserialize)]
struct MessageHeader {
    name: String,
    value: String,
}

impl MessageResponse {
    pub(crate) fn into_mail_message(self) -> MailMessage {
        let subject = self.payload.and_then(|p| {
            p.headers
                .into_iter()
                .find(|h| h.name == "Subject")
                .map(|h| h.value)
        });
        MailMessage {
            id: self.id,
            subject,
            snippet: self.snippet,
        }
    }
}

/// Read-only client for the signed-in user's mailbox.
pub(crate) struct GmailClient {
    http: Client,
    access_token: String,
    base: String,
}

impl GmailClient {
    pub(crate) fn new(http: Client, access_token: String) -> Self {
        Self {
            http,
            access_token,
            base: GMAIL_API.to_string(),
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, GoogleError> {
        let mut url = Url::parse(&self.base)
            .map_err(|e| GoogleError::Malformed(format!("bad Gmail base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| GoogleError::Malformed("Gmail base URL cannot have a path".into()))?
            .extend(["users", "me", "messages"])
            .extend(segments);
        Ok(url)
    }

    fn list_page(&self, q: &str, page_token: Option<&str>) -> Result<ListResponse, GoogleError> {
        let mut request = self
            .http
            .get(self.url(&[])?)
            .bearer_auth(&self.access_token)
            .query(&[("q", q)]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }
        let response = check_status("Gmail", request.send()?)?;
        Ok(response.json()?)
    }
}

impl MailSource for GmailClient {
    fn search(&self, query: &MailQuery) -> Result<Vec<String>> {
        let q = search_expression(query);
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.list_page(&q, page_token.as_deref())?;
            ids.extend(page.messages.into_iter().map(|m| m.id));
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(ids)
    }

    fn fetch(&self, id: &str) -> Result<MailMessage> {
        let response = self
            .http
            .get(self.url(&[id])?)
            .bearer_auth(&self.access_token)
            .query(&[("format", "metadata"), ("metadataHeaders", "Subject")])
            .send()
            .map_err(GoogleError::from)?;
        let message: MessageResponse = check_status("Gmail", response)?
            .json()
            .map_err(GoogleError::from)?;
        Ok(message.into_mail_message())
    }
}

#[cfg(test)]
#[path = "gmail_tests.rs"]
mod tests;
