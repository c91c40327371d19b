//! # Cache Identity Keys
//!
//! Comment sets are cached per page, or per block within a page. `CacheKey`
//! keeps the two scopes distinct as a typed pair: `(page)` never collides
//! with `(page, block)`, and two distinct pairs never collide, even when an
//! id happens to contain the separator character.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::RealtimeError;

/// Separator between page and block when a key is rendered as a string.
pub const KEY_SEPARATOR: char = ':';

/// Identity of a cached comment set: a page, or one block within a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheKey {
    page_id: String,
    block_id: Option<String>,
}

impl CacheKey {
    /// Build a key for a page-level comment set.
    pub fn page(page_id: impl Into<String>) -> Result<Self, RealtimeError> {
        Self::build(page_id.into(), None)
    }

    /// Build a key for a block-scoped comment set.
    pub fn block(
        page_id: impl Into<String>,
        block_id: impl Into<String>,
    ) -> Result<Self, RealtimeError> {
        Self::build(page_id.into(), Some(block_id.into()))
    }

    /// Build a key from a page id and an optional block id.
    pub fn new(
        page_id: impl Into<String>,
        block_id: Option<String>,
    ) -> Result<Self, RealtimeError> {
        Self::build(page_id.into(), block_id)
    }

    fn build(page_id: String, block_id: Option<String>) -> Result<Self, RealtimeError> {
        if page_id.is_empty() {
            return Err(RealtimeError::MissingPageId);
        }
        if matches!(&block_id, Some(b) if b.is_empty()) {
            return Err(RealtimeError::MissingBlockId);
        }
        Ok(Self { page_id, block_id })
    }

    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    pub fn block_id(&self) -> Option<&str> {
        self.block_id.as_deref()
    }

    /// True for the page-level key of `page_id` and every block-scoped key
    /// under it. Page-wide invalidation matches on this.
    pub fn is_on_page(&self, page_id: &str) -> bool {
        self.page_id == page_id
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.block_id {
            Some(block_id) => write!(f, "{}{}{}", self.page_id, KEY_SEPARATOR, block_id),
            None => write!(f, "{}", self.page_id),
        }
    }
}
