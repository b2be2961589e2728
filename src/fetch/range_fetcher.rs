//! RangeFetcher - one windowed request per node, decoded and normalized.

use std::sync::Arc;

use grid_types::{NodeRequest, NormalizedResponse};
use serde_json::Value;
use tracing::{debug, warn};

use super::descriptor::LevelDescriptor;
use super::transport::{HttpResponse, HttpTransport};
use crate::error::FetchError;
use crate::normalize::normalize_response;

/// Plain-text error bodies longer than this are ignored in favour of the status text
const MAX_TEXT_ERROR_LEN: usize = 200;

#[derive(Clone)]
pub struct RangeFetcher {
    transport: Arc<dyn HttpTransport>,
}

impl RangeFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Fetch one window of rows for `request` using `descriptor`.
    ///
    /// The root level retries exactly once, as a GET, when the POST comes back
    /// with a non-success status. Transport failures are never retried.
    pub async fn fetch(
        &self,
        descriptor: &LevelDescriptor,
        request: &NodeRequest,
    ) -> Result<NormalizedResponse, FetchError> {
        request.validate()?;

        let primary = descriptor.build_request(request);
        let mut url = primary.url.to_string();
        debug!(
            level = %request.level,
            parent_id = request.parent_id.as_deref().unwrap_or(""),
            start_row = request.start_row,
            end_row = request.end_row,
            method = ?primary.method,
            url = %url,
            "fetching rows"
        );
        let mut response = self.transport.send(primary).await?;

        if !response.is_success() {
            if let Some(fallback) = descriptor.fallback_request(request) {
                warn!(
                    status = response.status,
                    url = %url,
                    fallback = %fallback.url,
                    "root listing failed, retrying once with GET"
                );
                url = fallback.url.to_string();
                response = self.transport.send(fallback).await?;
            }
        }

        let payload = decode(response, &url)?;
        let normalized = normalize_response(&payload);
        debug!(
            level = %request.level,
            rows = normalized.len(),
            shape = %normalized
                .shape
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            "rows fetched"
        );
        Ok(descriptor.map_rows(normalized))
    }
}

/// Turn a response into JSON, or the matching fetch error.
fn decode(response: HttpResponse, url: &str) -> Result<Value, FetchError> {
    if !response.is_success() {
        return Err(FetchError::RequestFailed {
            status: response.status,
            message: error_message(&response),
        });
    }
    serde_json::from_slice(&response.body).map_err(|e| FetchError::MalformedResponse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Server-supplied message if the error body carries one, else the status text.
fn error_message(response: &HttpResponse) -> String {
    if let Ok(body) = serde_json::from_slice::<Value>(&response.body) {
        if let Some(message) = json_error_message(&body) {
            return message;
        }
    } else if let Ok(text) = std::str::from_utf8(&response.body) {
        let text = text.trim();
        if !text.is_empty() && !text.starts_with('<') && text.len() <= MAX_TEXT_ERROR_LEN {
            return text.to_string();
        }
    }

    if response.status_text.is_empty() {
        format!("HTTP {}", response.status)
    } else {
        response.status_text.clone()
    }
}

fn json_error_message(body: &Value) -> Option<String> {
    for key in ["error", "message", "detail"] {
        match body.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(Value::Object(inner)) => {
                if let Some(Value::String(s)) = inner.get("message") {
                    return Some(s.clone());
                }
            }
            _ => {}
        }
    }
    None
}
