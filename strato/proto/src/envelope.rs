//! Request and response envelopes exchanged with the analytics API.

use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ProtoError;

const REDACTED: &str = "**********";

/// Caller-supplied API token.
///
/// Always serialized as a bare JSON string, even when it was built from a
/// one-element sequence. `Debug` and `Display` never show the value.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Build a token from a sequence that must hold exactly one string.
    pub fn from_sequence<I>(items: I) -> Result<Self, ProtoError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut items = items.into_iter().map(Into::into).collect::<Vec<String>>();
        match items.len() {
            1 => Ok(Self(items.remove(0))),
            n => Err(ProtoError::TokenShape(n)),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiToken({REDACTED})")
    }
}

impl Display for ApiToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<&str> for ApiToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for ApiToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&String> for ApiToken {
    fn from(token: &String) -> Self {
        Self(token.clone())
    }
}

impl From<&ApiToken> for ApiToken {
    fn from(token: &ApiToken) -> Self {
        token.clone()
    }
}

impl<S: Into<String>> From<[S; 1]> for ApiToken {
    fn from([token]: [S; 1]) -> Self {
        Self(token.into())
    }
}

impl TryFrom<Vec<String>> for ApiToken {
    type Error = ProtoError;

    fn try_from(items: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_sequence(items)
    }
}

/// `{"token": ..., "query": ...}`
#[derive(Debug, Serialize)]
pub struct RequestEnvelope<'a, Q> {
    pub token: &'a ApiToken,
    pub query: &'a Q,
}

impl<'a, Q: Serialize> RequestEnvelope<'a, Q> {
    pub fn new(token: &'a ApiToken, query: &'a Q) -> Self {
        Self { token, query }
    }
}

/// `{"token": ..., "queries": {"name": ..., ...}}`
#[derive(Debug, Serialize)]
pub struct BatchRequestEnvelope<'a, Q> {
    pub token: &'a ApiToken,
    pub queries: BTreeMap<&'a str, &'a Q>,
}

impl<'a, Q: Serialize> BatchRequestEnvelope<'a, Q> {
    pub fn new(token: &'a ApiToken, queries: impl IntoIterator<Item = (&'a str, &'a Q)>) -> Self {
        Self {
            token,
            queries: queries.into_iter().collect(),
        }
    }
}

/// `{"success": bool, "message"?: string, "data"?: any}`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResponseEnvelope {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ResponseEnvelope {
    /// Create a successful response carrying `data`
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Create a rejected response carrying `message`
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}
