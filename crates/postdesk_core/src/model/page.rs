//! Paged listing request and result envelopes.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One page of matching items plus the count of every match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    /// Count over the whole filtered set, not just `items`.
    pub total_count: u64,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: u64) -> Self {
        Self { items, total_count }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    /// Number of pages needed to show `total_count` items at `page_size`.
    pub fn page_count(&self, page_size: u32) -> u64 {
        if page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(page_size))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
        }
    }
}

/// Listing order. Ties are always broken by id ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    Name,
    NameDesc,
    #[default]
    DisplayOrder,
}

impl SortOrder {
    /// Parses a caller-supplied key. Unknown or empty keys fall back to
    /// `DisplayOrder`.
    pub fn from_key(key: &str) -> Self {
        match key.trim() {
            "Name" => Self::Name,
            "NameDesc" => Self::NameDesc,
            _ => Self::DisplayOrder,
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::NameDesc => "NameDesc",
            Self::DisplayOrder => "DisplayOrder",
        }
    }

    /// Next order when a list header for `name` is toggled.
    pub fn cycle_name(self) -> Self {
        match self {
            Self::DisplayOrder => Self::Name,
            Self::Name => Self::NameDesc,
            Self::NameDesc => Self::DisplayOrder,
        }
    }
}

impl FromStr for SortOrder {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_key(s))
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_key())
    }
}

/// Owner scope a caller lists under.
///
/// The base post table has no owner column, so adapters accept this value
/// without narrowing by it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentIdentifier {
    #[default]
    None,
    Numeric(i64),
    Key(String),
}

impl From<i64> for ParentIdentifier {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for ParentIdentifier {
    fn from(value: &str) -> Self {
        Self::Key(value.to_string())
    }
}

impl From<String> for ParentIdentifier {
    fn from(value: String) -> Self {
        Self::Key(value)
    }
}

/// Paged listing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page_index: u32,
    /// Must be greater than zero.
    pub page_size: u32,
    /// Accepted for caller compatibility; search always targets `name`.
    pub search_field: String,
    pub search_query: String,
    pub sort_order: SortOrder,
    pub parent: ParentIdentifier,
    pub category: String,
}

impl PageRequest {
    pub fn new(page_index: u32, page_size: u32) -> Self {
        Self {
            page_index,
            page_size,
            search_field: String::new(),
            search_query: String::new(),
            sort_order: SortOrder::default(),
            parent: ParentIdentifier::default(),
            category: String::new(),
        }
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    pub fn search_field(mut self, field: impl Into<String>) -> Self {
        self.search_field = field.into();
        self
    }

    pub fn sort(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn parent(mut self, parent: impl Into<ParentIdentifier>) -> Self {
        self.parent = parent.into();
        self
    }

    /// Rows skipped before this page starts.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_index) * u64::from(self.page_size)
    }
}
