// reqwest-backed Gateway.
//
// Base URL handling, query strings, multipart bodies, and translation of
// HTTP statuses into `Error`. The `{ success, data, message }` envelope is
// decoded but not judged here; callers decide what `success: false` means.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::envelope::ApiResponse;
use crate::error::Error;
use crate::gateway::{FormPart, Gateway, Query};
use crate::transport::TransportConfig;

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Gateway talking JSON over HTTP to the backend's REST API.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpGateway {
    /// Build from a base URL (e.g. `https://tracker.example/api`) and a
    /// transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let mut url = Url::parse(base_url)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(Self {
            http,
            base_url: url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join a route (`"/mlas"` or `"mlas"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

// ── Response handling ────────────────────────────────────────────────

async fn handle_response(resp: reqwest::Response) -> Result<ApiResponse<Value>, Error> {
    let status = resp.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthorized);
    }

    let body = resp.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .or_else(|| (!body.is_empty()).then(|| preview(&body)))
            .unwrap_or_else(|| status.to_string());
        return Err(Error::Http {
            status: status.as_u16(),
            message,
        });
    }

    // 204 and friends: treat an empty body as a bare success.
    if body.trim().is_empty() {
        return Ok(ApiResponse::ok_empty());
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body: body.clone(),
    })
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn get(&self, path: &str, query: &Query) -> Result<ApiResponse<Value>, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={:?}", query.pairs());

        let resp = self.http.get(url).query(query.pairs()).send().await?;
        handle_response(resp).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse<Value>, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        handle_response(resp).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse<Value>, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse<Value>, Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        handle_response(resp).await
    }

    async fn post_multipart(
        &self,
        path: &str,
        parts: Vec<FormPart>,
    ) -> Result<ApiResponse<Value>, Error> {
        let url = self.url(path)?;
        debug!("POST (multipart, {} parts) {url}", parts.len());

        let mut form = Form::new();
        for part in parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File {
                    name,
                    file_name,
                    mime,
                    bytes,
                } => {
                    let file = Part::bytes(bytes.to_vec())
                        .file_name(file_name)
                        .mime_str(&mime)?;
                    form.part(name, file)
                }
            };
        }

        let resp = self.http.post(url).multipart(form).send().await?;
        handle_response(resp).await
    }
}
