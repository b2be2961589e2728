//! Level descriptors: how rows of one tree level are requested.
//!
//! Built once from configuration and never mutated afterwards.

use std::fmt;
use std::sync::Arc;

use grid_types::{Level, NodeRequest, NormalizedResponse, Row};
use serde_json::json;
use url::Url;

use super::transport::HttpRequest;
use crate::error::FetchError;

/// Per-level transform applied to each fetched row
pub type RowMapper = Arc<dyn Fn(Row) -> Row + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMethod {
    /// `POST {startRow, endRow}`; one `GET ...&limit=<n>` on a non-success status
    PostWithGetFallback,
    /// `GET ?<parent_key>=<id>&period=..&startRow=..&endRow=..`
    Get,
}

#[derive(Clone)]
pub struct LevelDescriptor {
    pub level: Level,
    /// Endpoint with any fixed query parameters already present
    pub endpoint: Url,
    /// Query parameter naming the parent row id (`campaign_id`, `adset_id`)
    pub parent_key: Option<String>,
    pub period: String,
    pub method: FetchMethod,
    row_mapper: Option<RowMapper>,
}

impl fmt::Debug for LevelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelDescriptor")
            .field("level", &self.level)
            .field("endpoint", &self.endpoint.as_str())
            .field("parent_key", &self.parent_key)
            .field("period", &self.period)
            .field("method", &self.method)
            .field("row_mapper", &self.row_mapper.is_some())
            .finish()
    }
}

impl LevelDescriptor {
    /// Descriptor for the root listing.
    pub fn root(endpoint: Url, period: impl Into<String>) -> Self {
        Self {
            level: Level::Campaign,
            endpoint,
            parent_key: None,
            period: period.into(),
            method: FetchMethod::PostWithGetFallback,
            row_mapper: None,
        }
    }

    /// Descriptor for a drill-down level (ad-sets or ads).
    pub fn drill_down(
        level: Level,
        endpoint: Url,
        parent_key: impl Into<String>,
        period: impl Into<String>,
    ) -> Self {
        Self {
            level,
            endpoint,
            parent_key: Some(parent_key.into()),
            period: period.into(),
            method: FetchMethod::Get,
            row_mapper: None,
        }
    }

    pub fn with_row_mapper(mut self, mapper: RowMapper) -> Self {
        self.row_mapper = Some(mapper);
        self
    }

    /// Resolve an endpoint template, joining relative paths onto `base_url`.
    pub fn resolve_endpoint(template: &str, base_url: Option<&Url>) -> Result<Url, FetchError> {
        let invalid = |reason: String| FetchError::InvalidUrl {
            url: template.to_string(),
            reason,
        };
        match Url::parse(template) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match base_url {
                Some(base) => base.join(template).map_err(|e| invalid(e.to_string())),
                None => Err(invalid("relative endpoint and no base_url configured".into())),
            },
            Err(e) => Err(invalid(e.to_string())),
        }
    }

    /// First request for a window of rows.
    pub fn build_request(&self, request: &NodeRequest) -> HttpRequest {
        match self.method {
            FetchMethod::PostWithGetFallback => HttpRequest::post_json(
                self.endpoint.clone(),
                json!({ "startRow": request.start_row, "endRow": request.end_row }),
            ),
            FetchMethod::Get => {
                let mut url = self.endpoint.clone();
                {
                    let mut query = url.query_pairs_mut();
                    if let (Some(key), Some(parent)) = (&self.parent_key, &request.parent_id) {
                        query.append_pair(key, parent);
                    }
                    query
                        .append_pair("period", &request.period)
                        .append_pair("startRow", &request.start_row.to_string())
                        .append_pair("endRow", &request.end_row.to_string());
                }
                HttpRequest::get(url)
            }
        }
    }

    /// Fallback issued after a non-success status on the first request.
    pub fn fallback_request(&self, request: &NodeRequest) -> Option<HttpRequest> {
        match self.method {
            FetchMethod::PostWithGetFallback => {
                let mut url = self.endpoint.clone();
                url.query_pairs_mut()
                    .append_pair("limit", &request.block_size().to_string());
                Some(HttpRequest::get(url))
            }
            FetchMethod::Get => None,
        }
    }

    pub(crate) fn map_rows(&self, mut response: NormalizedResponse) -> NormalizedResponse {
        if let Some(mapper) = &self.row_mapper {
            response.rows = response.rows.into_iter().map(|row| mapper(row)).collect();
        }
        response
    }
}
