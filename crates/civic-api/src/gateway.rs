// ── Gateway abstraction ──
//
// The request/response boundary consumed by civic-core. Everything above
// this trait works against the JSON envelope only, so tests can script
// an in-memory gateway without touching HTTP.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::envelope::{ApiResponse, ListPayload};
use crate::error::Error;

/// Ordered query-string pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.push((key.into(), value.to_string()));
        self
    }

    /// Push only when `value` is present.
    pub fn push_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// One field of a multipart form.
#[derive(Debug, Clone)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: String,
        bytes: Bytes,
    },
}

/// The REST backend as seen by the data layer.
///
/// Every call answers with the `{ success, data, message }` envelope.
/// Implementations report transport and HTTP failures as [`Error`]; a
/// `success: false` envelope is returned as-is and judged by the caller.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn get(&self, path: &str, query: &Query) -> Result<ApiResponse<Value>, Error>;

    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse<Value>, Error>;

    async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse<Value>, Error>;

    async fn delete(&self, path: &str) -> Result<ApiResponse<Value>, Error>;

    async fn post_multipart(
        &self,
        path: &str,
        parts: Vec<FormPart>,
    ) -> Result<ApiResponse<Value>, Error>;
}

// ── Typed helpers ────────────────────────────────────────────────────

/// GET a single record.
pub async fn fetch_data<T: DeserializeOwned>(
    gateway: &dyn Gateway,
    path: &str,
    query: &Query,
) -> Result<T, Error> {
    gateway.get(path, query).await?.into_data()
}

/// GET a list, discarding pagination metadata.
pub async fn fetch_list<T: DeserializeOwned>(
    gateway: &dyn Gateway,
    path: &str,
    query: &Query,
) -> Result<Vec<T>, Error> {
    let payload: ListPayload<T> = gateway.get(path, query).await?.into_data()?;
    Ok(payload.into_items())
}

/// Which write verb to use for [`send_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteVerb {
    Post,
    Put,
}

/// POST or PUT a body and decode the echoed record.
pub async fn send_data<T: DeserializeOwned, B: Serialize + Sync>(
    gateway: &dyn Gateway,
    verb: WriteVerb,
    path: &str,
    body: &B,
) -> Result<T, Error> {
    let body = serde_json::to_value(body).map_err(|e| Error::Deserialization {
        message: format!("failed to encode request body: {e}"),
        body: String::new(),
    })?;
    let resp = match verb {
        WriteVerb::Post => gateway.post(path, &body).await?,
        WriteVerb::Put => gateway.put(path, &body).await?,
    };
    resp.into_data()
}

/// DELETE a resource, checking only the envelope's `success` flag.
pub async fn send_delete(gateway: &dyn Gateway, path: &str) -> Result<(), Error> {
    gateway.delete(path).await?.into_result()?;
    Ok(())
}
