//! HierarchicalDataSource - the grid-facing registry.
//!
//! Maps tree nodes to level descriptors and hands fetch results back to the
//! grid. Descriptors are fixed at construction; the generation arena is the
//! only shared mutable state and its lock is never held across an await.

pub mod callbacks;
pub mod generation;

use std::sync::Arc;

use grid_types::{Level, NodeKey, NodeRequest, NormalizedResponse};
use tracing::{debug, info, warn};

pub use callbacks::{Delivery, GetRowsCallbacks, LoadSuccessParams};
pub use generation::{GenerationArena, InFlight, RowWindow, Ticket};

use crate::config::{GridSourceConfig, StaleResponsePolicy};
use crate::error::{ConfigError, FetchError};
use crate::fetch::{HttpTransport, LevelDescriptor, RangeFetcher, RowMapper};

/// A node whose children the grid wants, plus the row window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowsNode {
    /// Level of the rows being listed
    pub level: Level,
    /// Id of the expanded parent row; `None` for the root listing
    pub parent_id: Option<String>,
    pub start_row: u64,
    pub end_row: u64,
}

impl RowsNode {
    pub fn root(start_row: u64, end_row: u64) -> Self {
        Self {
            level: Level::Campaign,
            parent_id: None,
            start_row,
            end_row,
        }
    }

    pub fn children_of(level: Level, parent_id: &str, start_row: u64, end_row: u64) -> Self {
        Self {
            level,
            parent_id: Some(parent_id.to_string()),
            start_row,
            end_row,
        }
    }

    /// Node from the grid's route of expanded row ids (`[]`, `[campaign]`,
    /// `[campaign, adset]`). The last id is the parent. Routes deeper than
    /// the ads level have no children and give `None`.
    pub fn from_route(route: &[String], start_row: u64, end_row: u64) -> Option<Self> {
        let depth = u8::try_from(route.len()).ok()?;
        let level = Level::from_depth(depth)?;
        Some(Self {
            level,
            parent_id: route.last().cloned(),
            start_row,
            end_row,
        })
    }

    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.level, self.parent_id.as_deref())
    }
}

/// Registry serving the campaign → ad-set → ad tree.
pub struct HierarchicalDataSource {
    fetcher: RangeFetcher,
    /// Indexed by `Level::depth()`
    descriptors: [LevelDescriptor; 3],
    generations: GenerationArena,
    stale_policy: StaleResponsePolicy,
}

impl HierarchicalDataSource {
    /// Build the registry from validated configuration.
    ///
    /// All endpoint templates are resolved here, so a bad URL fails
    /// construction instead of the first fetch.
    pub fn new(
        config: &GridSourceConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let base = config.parsed_base_url()?;

        let resolve = |field: &str, template: &str| {
            LevelDescriptor::resolve_endpoint(template, base.as_ref()).map_err(|e| match e {
                FetchError::InvalidUrl { reason, .. } => ConfigError::invalid(field, reason),
                other => ConfigError::invalid(field, other.to_string()),
            })
        };

        let root = LevelDescriptor::root(resolve("root_url", &config.root_url)?, &config.period);
        let adsets = &config.level_endpoints[0];
        let ads = &config.level_endpoints[1];
        let adset_descriptor = LevelDescriptor::drill_down(
            Level::AdSet,
            resolve("level_endpoints[0].url", &adsets.url)?,
            &adsets.parent_key,
            &config.period,
        );
        let ad_descriptor = LevelDescriptor::drill_down(
            Level::Ad,
            resolve("level_endpoints[1].url", &ads.url)?,
            &ads.parent_key,
            &config.period,
        );

        info!(
            root = %root.endpoint,
            adsets = %adset_descriptor.endpoint,
            ads = %ad_descriptor.endpoint,
            period = %config.period,
            stale_responses = ?config.stale_responses,
            "hierarchical data source configured"
        );

        Ok(Self {
            fetcher: RangeFetcher::new(transport),
            descriptors: [root, adset_descriptor, ad_descriptor],
            generations: GenerationArena::new(),
            stale_policy: config.stale_responses,
        })
    }

    /// Attach a row transform to one level. Call before sharing the source.
    pub fn with_row_mapper(mut self, level: Level, mapper: RowMapper) -> Self {
        let slot = &mut self.descriptors[level.depth() as usize];
        *slot = slot.clone().with_row_mapper(mapper);
        self
    }

    pub fn descriptor(&self, level: Level) -> &LevelDescriptor {
        &self.descriptors[level.depth() as usize]
    }

    pub fn stale_policy(&self) -> StaleResponsePolicy {
        self.stale_policy
    }

    /// Request for a window of `level` rows under `parent_id`, using the
    /// level's configured period.
    pub fn node_request(
        &self,
        level: Level,
        parent_id: Option<&str>,
        start_row: u64,
        end_row: u64,
    ) -> NodeRequest {
        NodeRequest::new(
            level,
            parent_id,
            self.descriptor(level).period.clone(),
            start_row,
            end_row,
        )
    }

    /// Fetch one window of rows for a node.
    ///
    /// Every call is a fresh fetch; nothing is cached or deduplicated.
    pub async fn request_rows(
        &self,
        parent_id: Option<&str>,
        level: Level,
        start_row: u64,
        end_row: u64,
    ) -> Result<NormalizedResponse, FetchError> {
        let request = self.node_request(level, parent_id, start_row, end_row);
        self.fetcher.fetch(self.descriptor(level), &request).await
    }

    /// Fetch a node's rows and hand the outcome to the grid's callbacks.
    ///
    /// At most one callback runs. Responses for nodes released while the
    /// fetch was in flight are dropped without any callback, as are responses
    /// superseded by a newer fetch of the same window when the policy is
    /// `DiscardSuperseded`.
    pub async fn get_rows(&self, node: RowsNode, callbacks: GetRowsCallbacks) -> Delivery {
        let request = self.node_request(
            node.level,
            node.parent_id.as_deref(),
            node.start_row,
            node.end_row,
        );
        if let Err(e) = request.validate() {
            let error = FetchError::from(e);
            warn!(node = %request.key(), error = %error, "rejected row request");
            return callbacks.deliver(Err(error), &request);
        }

        let supersede = self.stale_policy == StaleResponsePolicy::DiscardSuperseded;
        let in_flight = self.generations.begin(
            request.key(),
            (request.start_row, request.end_row),
            supersede,
        );

        let result = self.fetcher.fetch(self.descriptor(node.level), &request).await;

        let ticket = in_flight.ticket().clone();
        if !in_flight.finish() {
            debug!(
                node = %ticket.key,
                start_row = ticket.window.0,
                end_row = ticket.window.1,
                generation = ticket.generation,
                "discarding response for released or superseded node"
            );
            return Delivery::Discarded;
        }

        if let Err(e) = &result {
            warn!(
                node = %ticket.key,
                start_row = request.start_row,
                end_row = request.end_row,
                kind = e.kind(),
                error = %e,
                "row fetch failed"
            );
        }
        callbacks.deliver(result, &request)
    }

    /// Forget a collapsed node; in-flight responses for it are discarded.
    ///
    /// Descendants are not released implicitly: the grid releases each node
    /// it collapsed.
    pub fn release_node(&self, level: Level, parent_id: Option<&str>) -> bool {
        let released = self.generations.release(&NodeKey::new(level, parent_id));
        if released {
            debug!(level = %level, parent_id = parent_id.unwrap_or(""), "node released");
        }
        released
    }

    /// Forget every node (view torn down).
    pub fn release_all(&self) {
        self.generations.release_all();
        debug!("all nodes released");
    }

    /// Nodes with at least one fetch in flight
    pub fn active_nodes(&self) -> usize {
        self.generations.active_nodes()
    }
}
