use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use crate::core::env::Credentials;

/// Errors surfaced by a remote call.
///
/// `Remote` carries the message the service put in its error body; the other
/// variants mean the call never produced a usable answer.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("{message}")]
    Remote {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RpcError {
    /// Shorthand for a remote error carrying only a message.
    pub fn remote(message: impl Into<String>) -> Self {
        RpcError::Remote {
            status: 400,
            message: message.into(),
            code: None,
        }
    }

    /// True for "relation already exists" style errors, which a migration
    /// re-run is expected to hit.
    pub fn is_already_exists(&self) -> bool {
        self.to_string().contains("already exists")
    }
}

/// The remote operations the commands need from the database service.
///
/// Kept as a trait so the commands can be driven by a fake client in tests.
pub trait RpcClient {
    /// Invokes the server-side function `function` with JSON `args`.
    fn rpc(&self, function: &str, args: &Value) -> Result<Value, RpcError>;

    /// Selects a single column of `table`, limited to one row.
    fn select_column(&self, table: &str, column: &str) -> Result<Value, RpcError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// `RpcClient` over the service's REST interface.
pub struct RestClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    pub fn new(credentials: &Credentials) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("app-devkit/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: credentials.url.trim_end_matches('/').to_string(),
            api_key: credentials.key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

impl RpcClient for RestClient {
    fn rpc(&self, function: &str, args: &Value) -> Result<Value, RpcError> {
        let url = self.rpc_url(function);
        debug!("POST {url}");
        trace!("rpc args: {args}");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(args)
            .send()?;

        read_response(response)
    }

    fn select_column(&self, table: &str, column: &str) -> Result<Value, RpcError> {
        let url = self.table_url(table);
        debug!("GET {url}?select={column}&limit=1");

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[("select", column), ("limit", "1")])
            .send()?;

        read_response(response)
    }
}

fn read_response(response: Response) -> Result<Value, RpcError> {
    let status = response.status();
    let body = response.text()?;
    debug!("response status: {status}");
    trace!("response body: {body}");

    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(&body)?);
    }

    Err(remote_error(status.as_u16(), &body))
}

/// Builds a `Remote` error from a non-success response body.
///
/// Only the message is shown to the user; `details` and `hint` go to the
/// debug log.
fn remote_error(status: u16, body: &str) -> RpcError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => {
            if let Some(details) = &parsed.details {
                debug!("error details: {details}");
            }
            if let Some(hint) = &parsed.hint {
                debug!("error hint: {hint}");
            }
            RpcError::Remote {
                status,
                message: parsed
                    .message
                    .unwrap_or_else(|| format!("HTTP status {status}")),
                code: parsed.code,
            }
        }
        Err(_) => RpcError::Remote {
            status,
            message: if body.trim().is_empty() {
                format!("HTTP status {status}")
            } else {
                body.trim().to_string()
            },
            code: None,
        },
    }
}
