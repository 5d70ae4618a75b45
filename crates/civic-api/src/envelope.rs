// ── Response envelope ──
//
// Every backend route answers `{ success, data?, message? }`. List routes
// put either a bare array or `{ data: [], pagination }` inside `data`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Message used when the backend rejects a request without saying why.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Request failed";

/// The `{ success, data, message }` envelope wrapping every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Check `success`, returning the optional payload.
    ///
    /// `success: false` is a logical failure even when the HTTP status was
    /// 2xx, and becomes [`Error::Rejected`] carrying the backend message.
    pub fn into_result(self) -> Result<Option<T>, Error> {
        if self.success {
            Ok(self.data)
        } else {
            Err(Error::Rejected {
                message: self
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_owned()),
            })
        }
    }
}

impl ApiResponse<serde_json::Value> {
    /// Check `success` and decode the payload into `T`.
    ///
    /// A successful envelope without `data` is a decoding error.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, Error> {
        let value = self.into_result()?.ok_or_else(|| Error::Deserialization {
            message: "response envelope has no data".into(),
            body: String::new(),
        })?;
        decode(value)
    }
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// A page of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// List payload as found inside the envelope: paginated or bare.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    Paged(Paginated<T>),
    Bare(Vec<T>),
}

impl<T> ListPayload<T> {
    /// The records, with any pagination metadata discarded.
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Paged(page) => page.data,
            Self::Bare(items) => items,
        }
    }

    pub fn pagination(&self) -> Option<Pagination> {
        match self {
            Self::Paged(page) => Some(page.pagination),
            Self::Bare(_) => None,
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, Error> {
    serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}
