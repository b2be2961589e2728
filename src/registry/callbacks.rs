//! Boundary adapter for the grid's two callback generations.
//!
//! Newer grids hand over `success({rowData, rowCount})` / `fail()`; older ones
//! `successCallback(rows, lastRow)` / `failCallback()`. The data source works
//! on `Result` internally and only this adapter knows about callbacks.

use grid_types::{NodeRequest, NormalizedResponse, Row};
use tracing::warn;

use crate::error::FetchError;

/// Argument of the object-style success callback
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSuccessParams {
    pub row_data: Vec<Row>,
    /// Total rows for the node when known
    pub row_count: Option<u64>,
}

type SuccessFn = Box<dyn FnOnce(LoadSuccessParams) + Send>;
type LegacySuccessFn = Box<dyn FnOnce(Vec<Row>, Option<u64>) + Send>;
type FailFn = Box<dyn FnOnce(&FetchError) + Send>;
type LegacyFailFn = Box<dyn FnOnce() + Send>;

/// Outcome of one `get_rows` call
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Rows handed to a success callback
    Rows { count: usize },
    /// Failure handed to a failure callback
    Failed(FetchError),
    /// Response arrived for a released or superseded node; no callback ran
    Discarded,
    /// The caller supplied no callback for this outcome
    Undeliverable,
}

/// Callbacks supplied by the grid for one `get_rows` call.
///
/// At most one callback runs per call. The object-style callbacks win when
/// both generations are present.
#[derive(Default)]
pub struct GetRowsCallbacks {
    success: Option<SuccessFn>,
    fail: Option<FailFn>,
    success_callback: Option<LegacySuccessFn>,
    fail_callback: Option<LegacyFailFn>,
}

impl GetRowsCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object-style success: `success({rowData, rowCount})`
    pub fn success(mut self, f: impl FnOnce(LoadSuccessParams) + Send + 'static) -> Self {
        self.success = Some(Box::new(f));
        self
    }

    /// Object-style failure
    pub fn fail(mut self, f: impl FnOnce(&FetchError) + Send + 'static) -> Self {
        self.fail = Some(Box::new(f));
        self
    }

    /// Legacy success: `successCallback(rows, lastRow)`
    pub fn success_callback(
        mut self,
        f: impl FnOnce(Vec<Row>, Option<u64>) + Send + 'static,
    ) -> Self {
        self.success_callback = Some(Box::new(f));
        self
    }

    /// Legacy failure: `failCallback()`
    pub fn fail_callback(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.fail_callback = Some(Box::new(f));
        self
    }

    /// Hand a fetch result to whichever callback the caller supplied.
    pub(crate) fn deliver(
        self,
        result: Result<NormalizedResponse, FetchError>,
        request: &NodeRequest,
    ) -> Delivery {
        match result {
            Ok(response) => {
                let row_count = row_count(&response, request);
                let count = response.rows.len();
                if let Some(success) = self.success {
                    success(LoadSuccessParams {
                        row_data: response.rows,
                        row_count,
                    });
                } else if let Some(success_callback) = self.success_callback {
                    success_callback(response.rows, row_count);
                } else {
                    warn!(node = %request.key(), "no success callback supplied, rows dropped");
                    return Delivery::Undeliverable;
                }
                Delivery::Rows { count }
            }
            Err(error) => {
                if let Some(fail) = self.fail {
                    fail(&error);
                } else if let Some(fail_callback) = self.fail_callback {
                    fail_callback();
                } else {
                    warn!(node = %request.key(), "no failure callback supplied");
                    return Delivery::Undeliverable;
                }
                Delivery::Failed(error)
            }
        }
    }
}

/// Row count reported to the grid.
///
/// The backend's total wins; otherwise a short block means the last row is
/// known, and a full block leaves it open.
fn row_count(response: &NormalizedResponse, request: &NodeRequest) -> Option<u64> {
    response.total_hint.or_else(|| {
        let received = response.rows.len() as u64;
        (received < request.block_size()).then(|| request.start_row + received)
    })
}
