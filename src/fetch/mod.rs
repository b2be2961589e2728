//! Windowed fetching of one tree level.
//!
//! - `descriptor` - per-level endpoint, parent key, period and fetch method
//! - `transport` - the `HttpTransport` seam and its reqwest implementation
//! - `range_fetcher` - request building, root fallback, decoding, normalization

pub mod descriptor;
pub mod range_fetcher;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use descriptor::{FetchMethod, LevelDescriptor, RowMapper};
pub use range_fetcher::RangeFetcher;
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
