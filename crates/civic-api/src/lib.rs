//! Async REST gateway for the civic issue tracker backend.
//!
//! - **[`Gateway`]**: the request/response boundary the data layer talks
//!   to: GET with query strings, POST/PUT with JSON bodies, DELETE, and
//!   multipart uploads, all answering the `{ success, data, message }`
//!   [`ApiResponse`] envelope.
//! - **[`HttpGateway`]**: the reqwest implementation, configured through
//!   [`TransportConfig`].
//! - Typed helpers ([`fetch_list`], [`fetch_data`], [`send_data`],
//!   [`send_delete`]) decode envelope payloads with serde.

pub mod envelope;
pub mod error;
pub mod gateway;
pub mod http;
pub mod transport;

pub use envelope::{ApiResponse, DEFAULT_FAILURE_MESSAGE, ListPayload, Paginated, Pagination};
pub use error::Error;
pub use gateway::{
    FormPart, Gateway, Query, WriteVerb, fetch_data, fetch_list, send_data, send_delete,
};
pub use http::HttpGateway;
pub use transport::TransportConfig;
