//! ads-grid - hierarchical data source for campaign/ad-set/ad grids
//!
//! Serves a three-level tree (campaigns → ad-sets → ads) to a server-side grid
//! widget. Each level is fetched on demand in row windows, whatever envelope the
//! backend wraps its rows in is normalized away, and cell values are classified
//! into display buckets.
//!
//! # Architecture
//!
//! ```text
//! grid widget ──get_rows/request_rows──▶ HierarchicalDataSource
//!                                          │  level descriptors (immutable)
//!                                          │  generation arena (stale guard)
//!                                          ▼
//!                                       RangeFetcher ──▶ HttpTransport (reqwest)
//!                                          │
//!                                          ▼
//!                                       normalize_response
//!
//! cell formatting ──▶ classify / numeric   (no coupling to fetching)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use ads_grid::{GridSourceConfig, HierarchicalDataSource, ReqwestTransport};
//! use grid_types::Level;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = GridSourceConfig::new(
//!     "https://backend.example/api/campaigns?ssrm=1",
//!     "https://backend.example/api/adsets",
//!     "https://backend.example/api/ads",
//! )
//! .period("TODAY");
//! let transport = Arc::new(ReqwestTransport::from_config(&config)?);
//! let source = HierarchicalDataSource::new(&config, transport)?;
//!
//! let adsets = source.request_rows(Some("C100"), Level::AdSet, 0, 200).await?;
//! println!("{} ad-sets", adsets.len());
//! # Ok(())
//! # }
//! ```

pub mod cells;
pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod numeric;
pub mod registry;

// Re-exports
pub use classify::{classify_fraction, classify_status, strip_markup, PLACEHOLDER};
pub use config::{GridSourceConfig, LevelEndpoint, StaleResponsePolicy};
pub use error::{ConfigError, FetchError};
pub use fetch::{
    FetchMethod, HttpMethod, HttpRequest, HttpResponse, HttpTransport, LevelDescriptor,
    RangeFetcher, ReqwestTransport, RowMapper,
};
pub use normalize::{normalize, normalize_response};
pub use numeric::{format_brl, format_integer, format_percent, parse_locale_number};
pub use registry::{
    Delivery, GetRowsCallbacks, HierarchicalDataSource, LoadSuccessParams, RowsNode,
};

pub use grid_types::{
    Bucket, ClassificationResult, EnvelopeShape, Level, NodeKey, NodeRequest, NodeRequestError,
    NormalizedResponse, Row,
};
