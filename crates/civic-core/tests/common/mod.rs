// Shared fixtures for civic-core integration tests: a scripted in-memory
// gateway and record builders.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use civic_api::{ApiResponse, Error, FormPart, Gateway, Query};
use civic_core::{Constituency, Mla, MlaStatus, Party, ReservedCategory};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Multipart,
}

/// A canned gateway answer.
#[derive(Debug, Clone)]
pub enum Reply {
    /// `success: true` with this payload.
    Data(Value),
    /// `success: true` with no payload.
    Empty,
    /// `success: false` with this message.
    Rejected(String),
    /// Non-2xx transport failure.
    Http(u16, String),
}

impl Reply {
    fn into_result(self) -> Result<ApiResponse<Value>, Error> {
        match self {
            Self::Data(v) => Ok(ApiResponse::ok(v)),
            Self::Empty => Ok(ApiResponse::ok_empty()),
            Self::Rejected(m) => Ok(ApiResponse::failure(m)),
            Self::Http(status, message) => Err(Error::Http { status, message }),
        }
    }
}

#[derive(Default)]
struct Route {
    queued: VecDeque<(Reply, Duration)>,
    standing: Option<Reply>,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// In-memory gateway answering from scripted routes.
///
/// Queued replies are used first, in order; after that the standing reply
/// for the route answers every call. Unscripted routes answer 404.
#[derive(Default)]
pub struct MockGateway {
    routes: Mutex<HashMap<(Method, String), Route>>,
    calls: Mutex<Vec<Call>>,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer every call to `path` with `reply`.
    pub fn respond(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_owned()))
            .or_default()
            .standing = Some(reply);
        self
    }

    /// Answer the next call to `path` with `reply`, after `delay`.
    pub fn respond_once_after(
        &self,
        method: Method,
        path: &str,
        reply: Reply,
        delay: Duration,
    ) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_owned()))
            .or_default()
            .queued
            .push_back((reply, delay));
        self
    }

    pub fn respond_list<T: Serialize>(&self, path: &str, items: &[T]) -> &Self {
        self.respond(Method::Get, path, Reply::Data(paged(items)))
    }

    /// A shared handle usable wherever the core takes a gateway.
    pub fn handle(self: &Arc<Self>) -> Arc<dyn Gateway> {
        self.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    async fn answer(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> Result<ApiResponse<Value>, Error> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_owned(),
            query,
            body,
        });
        let next = {
            let mut routes = self.routes.lock().unwrap();
            routes.get_mut(&(method, path.to_owned())).and_then(|route| {
                route
                    .queued
                    .pop_front()
                    .or_else(|| route.standing.clone().map(|r| (r, Duration::ZERO)))
            })
        };
        let (reply, delay) = next.unwrap_or_else(|| {
            (Reply::Http(404, format!("no route for {path}")), Duration::ZERO)
        });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply.into_result()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn get(&self, path: &str, query: &Query) -> Result<ApiResponse<Value>, Error> {
        self.answer(Method::Get, path, query.pairs().to_vec(), None)
            .await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse<Value>, Error> {
        self.answer(Method::Post, path, Vec::new(), Some(body.clone()))
            .await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse<Value>, Error> {
        self.answer(Method::Put, path, Vec::new(), Some(body.clone()))
            .await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse<Value>, Error> {
        self.answer(Method::Delete, path, Vec::new(), None).await
    }

    async fn post_multipart(
        &self,
        path: &str,
        parts: Vec<FormPart>,
    ) -> Result<ApiResponse<Value>, Error> {
        let names: Vec<Value> = parts
            .iter()
            .map(|p| match p {
                FormPart::Text { name, .. } | FormPart::File { name, .. } => json!(name),
            })
            .collect();
        self.answer(Method::Multipart, path, Vec::new(), Some(Value::Array(names)))
            .await
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────

/// A paginated list body as the backend sends it.
pub fn paged<T: Serialize>(items: &[T]) -> Value {
    json!({
        "data": items,
        "pagination": { "page": 1, "limit": 50, "total": items.len(), "total_pages": 1 }
    })
}

pub fn constituency(id: &str, district: &str) -> Constituency {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Constituency {
        id: id.into(),
        name: format!("Constituency {id}"),
        code: id.to_uppercase(),
        district: district.into(),
        reserved_category: ReservedCategory::General,
        population: 250_000,
        area: None,
        description: None,
        created_at: at,
        updated_at: at,
    }
}

pub fn mla(id: &str, constituency_id: &str, party_id: &str) -> Mla {
    Mla {
        id: id.into(),
        name: format!("MLA {id}"),
        email: format!("{id}@assembly.example"),
        phone: None,
        party_id: party_id.into(),
        constituency_id: constituency_id.into(),
        term_start: NaiveDate::from_ymd_opt(2021, 5, 1).unwrap(),
        term_end: NaiveDate::from_ymd_opt(2026, 4, 30).unwrap(),
        status: MlaStatus::Active,
        bio: None,
        photo_url: None,
    }
}

pub fn party(id: &str) -> Party {
    Party {
        id: id.into(),
        name: format!("Party {id}"),
        abbreviation: id.to_uppercase(),
        color: "#FF9933".into(),
        logo_url: None,
        description: None,
    }
}

/// Listener that counts how many times it was called.
pub fn counter() -> (Arc<std::sync::atomic::AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let inner = Arc::clone(&hits);
    (hits, move || {
        inner.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    })
}
