//! # External Collaborators
//!
//! The editor's remote surfaces, reduced to the interfaces this client
//! consumes. Persistence, identity and object storage are other systems'
//! concerns; the client only sees their success-or-message result shapes
//! and treats everything inside as opaque.

use folio_realtime::Comment;
use thiserror::Error;

/// Failure reported by a remote collaborator.
///
/// Opaque to the consistency core: the message is surfaced, never
/// interpreted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Remote persistence for comments.
///
/// A successful fetch returns the comment set in chronological order,
/// ascending by creation time.
pub trait CommentStore {
    fn fetch_comments(
        &self,
        page_id: &str,
        block_id: Option<&str>,
    ) -> Result<Vec<Comment>, StoreError>;
}

/// Identity provider for the current browsing session.
pub trait IdentityProvider {
    /// Stable identifier of the signed-in user, or `None` when
    /// unauthenticated.
    fn current_user(&self) -> Option<String>;
}

/// Object storage for cover images and other binary attachments.
///
/// Size and type limits are enforced by the implementation, not here.
pub trait ObjectStore {
    /// Store bytes at a path; returns the public URL.
    fn upload(&self, path: &str, bytes: &[u8]) -> Result<String, StoreError>;

    fn delete(&self, path: &str) -> Result<(), StoreError>;
}
