//! Transport and configuration errors.
//!
//! Contract failures are never returned as errors; they are collected into a
//! [`ValidationResult`](crate::schema::ValidationResult). Only problems that
//! prevent an assertion from being evaluated at all end up here.

use std::error::Error as StdError;
use std::fmt::{self, Display};

use thiserror::Error;

use crate::http::method::HttpMethod;

/// Coarse classification of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Dns,
    Connect,
    Tls,
    Read,
    Other,
}

impl Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransportKind::Dns => "DNS_ERROR",
            TransportKind::Connect => "CONNECT_ERROR",
            TransportKind::Tls => "TLS_ERROR",
            TransportKind::Read => "READ_ERROR",
            TransportKind::Other => "TRANSPORT_ERROR",
        };
        write!(f, "{label}")
    }
}

impl TransportKind {
    pub fn classify(err: &reqwest::Error) -> Self {
        Self::from_chain(
            &error_chain(err),
            err.is_connect(),
            err.is_body() || err.is_decode(),
            has_invalid_data(err),
        )
    }

    /// Classify from the rendered source chain. Text markers win over the
    /// reqwest flags, since a failed handshake is also reported as a connect error.
    fn from_chain(chain: &str, is_connect: bool, is_read: bool, invalid_data: bool) -> Self {
        let chain = chain.to_ascii_lowercase();
        if ["dns", "lookup address", "name or service not known", "no such host"]
            .iter()
            .any(|marker| chain.contains(marker))
        {
            return TransportKind::Dns;
        }
        if ["tls", "ssl", "certificate", "rustls", "handshake", "corrupt message", "alert"]
            .iter()
            .any(|marker| chain.contains(marker))
        {
            return TransportKind::Tls;
        }
        if is_connect {
            // The TCP connection was up but the peer answered garbage.
            return if invalid_data { TransportKind::Tls } else { TransportKind::Connect };
        }
        if is_read {
            return TransportKind::Read;
        }
        TransportKind::Other
    }
}

/// `err` followed by every `source()` below it, joined with `": "`.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.contains(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}

fn has_invalid_data(err: &(dyn StdError + 'static)) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::InvalidData)
        {
            return true;
        }
        source = cause.source();
    }
    false
}

#[derive(Debug, Error)]
pub enum HarnessError {
    /// The call did not complete within the configured request timeout.
    #[error("{method} {url} timed out after {timeout_ms} ms")]
    Timeout {
        method: HttpMethod,
        url: String,
        timeout_ms: u64,
    },

    /// DNS, connection, TLS or read failure below the HTTP layer.
    #[error("{method} {url} failed ({kind}): {message}")]
    Transport {
        method: HttpMethod,
        url: String,
        kind: TransportKind,
        message: String,
    },

    #[error("invalid URL `{input}`: {message}")]
    InvalidUrl { input: String, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    /// True when the target could not be reached at all.
    ///
    /// Runners treat this as an environment problem (skip) rather than a
    /// contract failure.
    pub fn is_environment_failure(&self) -> bool {
        matches!(
            self,
            HarnessError::Transport {
                kind: TransportKind::Dns | TransportKind::Connect,
                ..
            }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, HarnessError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
