use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};

use super::error::{check_status, GoogleError};

pub(crate) const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
pub(crate) const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Tokens this close to expiry are treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Persisted user credential, in the authorized-user JSON layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct StoredToken {
    pub(crate) token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub(crate) token_uri: String,
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    #[serde(default)]
    pub(crate) scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl StoredToken {
    pub(crate) fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry
            .is_some_and(|expiry| now + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry)
    }

    pub(crate) fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && !self.is_expired(now)
    }

    pub(crate) fn covers(&self, scopes: &[&str]) -> bool {
        scopes.iter().all(|s| self.scopes.iter().any(|have| have == s))
    }

    fn apply(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.token = response.access_token;
        if let Some(refresh) = response.refresh_token {
            self.refresh_token = Some(refresh);
        }
        self.expiry = response
            .expires_in
            .map(|secs| now + Duration::seconds(secs));
    }
}

/// Load/save capability for the user credential.
pub(crate) trait CredentialStore {
    fn load(&self) -> Result<Option<StoredToken>>;
    fn save(&self, token: &StoredToken) -> Result<()>;
}

/// Stores the user credential as a JSON file.
pub(crate) struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub(crate) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<StoredToken>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token cache: {}", self.path.display()))?;
        let token = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse token cache: {}", self.path.display()))?;
        Ok(Some(token))
    }

    fn save(&self, token: &StoredToken) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        let raw = serde_json::to_string_pretty(token).context("Failed to serialize token")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write token cache: {}", self.path.display()))
    }
}

/// OAuth client registration (`credentials.json`).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ClientSecrets {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub(crate) auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub(crate) token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub(crate) fn parse(raw: &str) -> Result<Self> {
        let file: ClientSecretsFile =
            serde_json::from_str(raw).context("Failed to parse client secrets")?;
        file.installed
            .or(file.web)
            .context("Client secrets contain neither an \"installed\" nor a \"web\" section")
    }

    pub(crate) fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read client secrets: {}", path.display()))?;
        Self::parse(&raw)
    }

    pub(crate) fn authorization_url(&self, redirect_uri: &str, scopes: &[&str]) -> Result<Url> {
        let scope = scopes.join(" ");
        Url::parse_with_params(
            &self.auth_uri,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .with_context(|| format!("Invalid auth_uri: {}", self.auth_uri))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

fn request_token(
    http: &Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, GoogleError> {
    let response = http.post(token_uri).form(form).send()?;
    let response = check_status("OAuth token endpoint", response)?;
    Ok(response.json()?)
}

/// Obtains a user access token: cached, refreshed, or granted interactively.
pub(crate) struct UserAuth<'a> {
    http: &'a Client,
    store: &'a dyn CredentialStore,
    secrets_path: PathBuf,
    port: u16,
    scopes: &'a [&'a str],
}

impl<'a> UserAuth<'a> {
    pub(crate) fn new(
        http: &'a Client,
        store: &'a dyn CredentialStore,
        secrets_path: &Path,
        port: u16,
        scopes: &'a [&'a str],
    ) -> Self {
        Self {
            http,
            store,
            secrets_path: secrets_path.to_path_buf(),
            port,
            scopes,
        }
    }

    pub(crate) fn access_token(&self) -> Result<String> {
        let now = Utc::now();
        let cached = self
            .store
            .load()?
            .filter(|t| t.covers(self.scopes));

        if let Some(token) = cached {
            if token.is_valid(now) {
                return Ok(token.token);
            }
            if token.refresh_token.is_some() {
                tracing::info!("Refreshing expired user token");
                let token = self.refresh(token, now)?;
                self.store.save(&token)?;
                return Ok(token.token);
            }
        }

        tracing::info!("No usable user token; starting interactive authorization");
        let token = self.grant(now)?;
        self.store.save(&token)?;
        Ok(token.token)
    }

    fn refresh(&self, mut token: StoredToken, now: DateTime<Utc>) -> Result<StoredToken> {
        let refresh_token = token.refresh_token.clone().unwrap_or_default();
        let response = request_token(
            self.http,
            &token.token_uri,
            &[
                ("client_id", token.client_id.as_str()),
                ("client_secret", token.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ],
        )
        .context("Failed to refresh user token")?;
        token.apply(response, now);
        Ok(token)
    }

    fn grant(&self, now: DateTime<Utc>) -> Result<StoredToken> {
        let secrets = ClientSecrets::from_file(&self.secrets_path)?;
        let redirect_uri = format!("http://localhost:{}/", self.port);
        let url = secrets.authorization_url(&redirect_uri, self.scopes)?;

        let listener = TcpListener::bind(("127.0.0.1", self.port))
            .with_context(|| format!("Failed to listen on port {}", self.port))?;
        println!("Please visit this URL to authorize this application: {url}");

        let code = wait_for_code(&listener)?;
        let response = request_token(
            self.http,
            &secrets.token_uri,
            &[
                ("code", code.as_str()),
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ],
        )
        .context("Failed to exchange authorization code")?;

        let mut token = StoredToken {
            token: String::new(),
            refresh_token: None,
            token_uri: secrets.token_uri,
            client_id: secrets.client_id,
            client_secret: secrets.client_secret,
            scopes: self.scopes.iter().map(|s| s.to_string()).collect(),
            expiry: None,
        };
        token.apply(response, now);
        Ok(token)
    }
}

fn wait_for_code(listener: &TcpListener) -> Result<String> {
    let (mut stream, _) = listener.accept().context("Failed to accept OAuth redirect")?;
    let mut request_line = String::new();
    BufReader::new(&stream)
        .read_line(&mut request_line)
        .context("Failed to read OAuth redirect")?;

    let result = parse_callback(&request_line);
    let body = match &result {
        Ok(_) => "The authentication flow has completed. You may close this window.",
        Err(_) => "The authentication flow failed. Check the terminal for details.",
    };
    write!(
        stream,
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
    .context("Failed to answer OAuth redirect")?;
    result
}

/// Pull the authorization code out of `GET /?code=...&scope=... HTTP/1.1`.
pub(crate) fn parse_callback(request_line: &str) -> Result<String> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .with_context(|| format!("Malformed redirect request: {}", request_line.trim()))?;
    let url = Url::parse("http://localhost")
        .and_then(|base| base.join(target))
        .with_context(|| format!("Malformed redirect target: {target}"))?;

    let mut code = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }
    if let Some(error) = error {
        anyhow::bail!("Authorization was denied: {error}");
    }
    code.filter(|c| !c.is_empty())
        .context("Redirect did not include an authorization code")
}

/// Service-account key file (the JSON downloaded from the cloud console).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServiceAccountKey {
    pub(crate) client_email: String,
    pub(crate) private_key: String,
    #[serde(default = "default_token_uri")]
    pub(crate) token_uri: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

impl ServiceAccountKey {
    pub(crate) fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read service account key: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse service account key: {}", path.display()))
    }

    pub(crate) fn claims(&self, scopes: &[&str], now: DateTime<Utc>) -> AssertionClaims {
        let iat = now.timestamp();
        AssertionClaims {
            iss: self.client_email.clone(),
            scope: scopes.join(" "),
            aud: self.token_uri.clone(),
            iat,
            exp: iat + 3600,
        }
    }

    /// Exchange a signed JWT assertion for an access token.
    pub(crate) fn access_token(&self, http: &Client, scopes: &[&str]) -> Result<String, GoogleError> {
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        let assertion = encode(
            &Header::new(Algorithm::RS256),
            &self.claims(scopes, Utc::now()),
            &key,
        )?;
        let response = request_token(
            http,
            &self.token_uri,
            &[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())],
        )?;
        if response.access_token.is_empty() {
            return Err(GoogleError::Credentials(format!(
                "Empty access token for {}",
                self.client_email
            )));
        }
        Ok(response.access_token)
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
