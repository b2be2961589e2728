//! Grid Types - Level 1 Foundation Types
//!
//! Pure data structures shared by the hierarchical data source and by anything
//! that consumes its output (cell formatters, the probe binary, tests).
//!
//! ## Contents
//!
//! - Tree levels and node keys (campaigns → ad-sets → ads)
//! - Per-fetch node requests and their invariants
//! - Rows and normalized responses
//! - Classification buckets
//!
//! ## Rules
//!
//! 1. **NO BUSINESS LOGIC** - fetching, normalization and classification live in `ads_grid`
//! 2. **NO WORKSPACE DEPENDENCIES**
//! 3. **SERIALIZABLE** - all types support serde

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

// ============================================================================
// TREE LEVELS
// ============================================================================

/// Depth in the three-tier tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    /// Level 0 - campaigns (root listing, no parent)
    Campaign,
    /// Level 1 - ad-sets under an expanded campaign
    AdSet,
    /// Level 2 - ads under an expanded ad-set (terminal)
    Ad,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Campaign, Level::AdSet, Level::Ad];

    /// Numeric depth (0, 1, 2)
    pub fn depth(self) -> u8 {
        match self {
            Level::Campaign => 0,
            Level::AdSet => 1,
            Level::Ad => 2,
        }
    }

    /// Level from a numeric depth; `None` below level 2
    pub fn from_depth(depth: u8) -> Option<Self> {
        match depth {
            0 => Some(Level::Campaign),
            1 => Some(Level::AdSet),
            2 => Some(Level::Ad),
            _ => None,
        }
    }

    /// Whether rows of this level carry a parent id
    pub fn requires_parent(self) -> bool {
        self != Level::Campaign
    }

    /// Level revealed by expanding a row of this level; `None` for ads
    pub fn child(self) -> Option<Self> {
        Self::from_depth(self.depth() + 1)
    }

    /// Whether rows of this level can be expanded
    pub fn is_expandable(self) -> bool {
        self.child().is_some()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Campaign => "campaign",
            Level::AdSet => "adset",
            Level::Ad => "ad",
        };
        write!(f, "{}", name)
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Level::from_depth(value).ok_or_else(|| format!("no tree level below 2 (got {})", value))
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.depth()
    }
}

/// Identity of a grid node whose children are fetched: the level being listed
/// plus the parent row id (absent for the root listing).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub level: Level,
    pub parent_id: Option<String>,
}

impl NodeKey {
    pub fn root() -> Self {
        Self {
            level: Level::Campaign,
            parent_id: None,
        }
    }

    pub fn new(level: Level, parent_id: Option<&str>) -> Self {
        Self {
            level,
            parent_id: parent_id.map(str::to_string),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent_id {
            Some(parent) => write!(f, "{}:{}", self.level, parent),
            None => write!(f, "{}:<root>", self.level),
        }
    }
}

// ============================================================================
// NODE REQUESTS
// ============================================================================

/// One windowed fetch of a node's children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRequest {
    pub level: Level,
    pub parent_id: Option<String>,
    pub period: String,
    pub start_row: u64,
    pub end_row: u64,
}

/// Violations of the `NodeRequest` invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeRequestError {
    #[error("empty row window: endRow ({end_row}) must be greater than startRow ({start_row})")]
    EmptyRange { start_row: u64, end_row: u64 },

    #[error("{level} rows require a parent id")]
    MissingParent { level: Level },

    #[error("{level} rows must not carry a parent id (got '{parent_id}')")]
    UnexpectedParent { level: Level, parent_id: String },
}

impl NodeRequest {
    pub fn new(
        level: Level,
        parent_id: Option<&str>,
        period: impl Into<String>,
        start_row: u64,
        end_row: u64,
    ) -> Self {
        Self {
            level,
            parent_id: parent_id.map(str::to_string),
            period: period.into(),
            start_row,
            end_row,
        }
    }

    /// Check the window and parent invariants.
    ///
    /// An empty-string parent id counts as missing.
    pub fn validate(&self) -> Result<(), NodeRequestError> {
        if self.end_row <= self.start_row {
            return Err(NodeRequestError::EmptyRange {
                start_row: self.start_row,
                end_row: self.end_row,
            });
        }
        match (&self.parent_id, self.level.requires_parent()) {
            (None, true) => Err(NodeRequestError::MissingParent { level: self.level }),
            (Some(p), true) if p.is_empty() => {
                Err(NodeRequestError::MissingParent { level: self.level })
            }
            (Some(p), false) => Err(NodeRequestError::UnexpectedParent {
                level: self.level,
                parent_id: p.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Number of rows the window asks for
    pub fn block_size(&self) -> u64 {
        self.end_row.saturating_sub(self.start_row)
    }

    pub fn key(&self) -> NodeKey {
        NodeKey {
            level: self.level,
            parent_id: self.parent_id.clone(),
        }
    }
}

// ============================================================================
// ROWS AND RESPONSES
// ============================================================================

/// One grid row as delivered by the backend.
///
/// Fields vary by level and are never validated; unknown fields pass through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub Value);

impl Row {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Field map, if the row is a JSON object
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.0.as_object()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Row id rendered as text (string or numeric `id` field)
    pub fn id(&self) -> Option<String> {
        match self.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Row {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Which envelope probe located the row array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeShape {
    BareArray,
    Rows,
    Data,
    List,
    ResultRows,
    ResultData,
    /// First array-valued property, by name
    FirstArrayProperty(String),
}

impl fmt::Display for EnvelopeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeShape::BareArray => write!(f, "[...]"),
            EnvelopeShape::Rows => write!(f, "rows"),
            EnvelopeShape::Data => write!(f, "data"),
            EnvelopeShape::List => write!(f, "list"),
            EnvelopeShape::ResultRows => write!(f, "result.rows"),
            EnvelopeShape::ResultData => write!(f, "result.data"),
            EnvelopeShape::FirstArrayProperty(key) => write!(f, "{}", key),
        }
    }
}

/// Ordered rows extracted from one backend payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedResponse {
    /// Rows in source order
    pub rows: Vec<Row>,
    /// Total row count advertised by the backend, if any
    pub total_hint: Option<u64>,
    /// Matched envelope; `None` when no row array was found
    pub shape: Option<EnvelopeShape>,
}

impl NormalizedResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when the payload parsed but carried no recognizable row array
    pub fn is_unlocated(&self) -> bool {
        self.shape.is_none()
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Semantic display category for a cell value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Success,
    Warning,
    Danger,
    Neutral,
}

impl Bucket {
    /// Presentation hint consumed by renderers
    pub fn css_class(self) -> &'static str {
        match self {
            Bucket::Success => "success",
            Bucket::Warning => "warning",
            Bucket::Danger => "danger",
            Bucket::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.css_class())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    pub bucket: Bucket,
}

impl ClassificationResult {
    pub fn new(label: impl Into<String>, bucket: Bucket) -> Self {
        Self {
            label: label.into(),
            bucket,
        }
    }
}
