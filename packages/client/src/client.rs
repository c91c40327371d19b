//! # Collaboration Client
//!
//! Wires the consistency layer together for one browsing session: comment
//! reads go through the cache, realtime events are classified and routed,
//! local block edits are staged for acknowledgment, and cover images are
//! pushed to object storage.
//!
//! One `CollabClient` exists per session and owns all of its mutable state;
//! nothing here is process-global. All operations are synchronous and run
//! to completion before the next event is handled.

use folio_realtime::{
    classify, BlockEventKind, BlockVersion, CacheConfig, CacheKey, Comment, CommentCache,
    ConflictResolver, EditSession, InvalidationScope, PresenceConfig, PresenceRecord,
    PresenceTracker, RealtimeError, RealtimeEvent, RemoteOutcome, ResolutionStrategy,
};
use serde_json::Value;
use thiserror::Error;

use crate::store::{CommentStore, IdentityProvider, StoreError};

/// Errors surfaced by the collaboration client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Realtime error: {0}")]
    Realtime(#[from] RealtimeError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No authenticated user")]
    Unauthenticated,
}

/// What handling one realtime message produced.
#[derive(Debug)]
pub enum EventOutcome {
    /// A remote block version was applied or reconciled.
    Block(RemoteOutcome),

    /// A collaborator's presence changed.
    Presence,

    /// The message shape was not recognized; it was logged and dropped.
    Dropped,
}

/// Per-session tuning for [`CollabClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub cache: CacheConfig,
    pub presence: PresenceConfig,
    pub strategy: ResolutionStrategy,
}

/// One client session of the collaborative editor.
pub struct CollabClient<S> {
    user_id: String,
    store: S,
    cache: CommentCache,
    presence: PresenceTracker,
    session: EditSession,
}

impl<S: CommentStore> CollabClient<S> {
    /// Build a client for an already-resolved user.
    pub fn new(user_id: impl Into<String>, store: S) -> Self {
        Self::with_config(user_id, store, ClientConfig::default())
    }

    pub fn with_config(user_id: impl Into<String>, store: S, config: ClientConfig) -> Self {
        let user_id = user_id.into();
        Self {
            session: EditSession::new(user_id.as_str(), ConflictResolver::new(config.strategy)),
            cache: CommentCache::with_config(config.cache),
            presence: PresenceTracker::with_config(config.presence),
            user_id,
            store,
        }
    }

    /// Resolve the current user through the identity provider and build a
    /// client for them.
    pub fn connect(
        identity: &impl IdentityProvider,
        store: S,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let user_id = identity.current_user().ok_or(ClientError::Unauthenticated)?;
        Ok(Self::with_config(user_id, store, config))
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Comments for a page, or one block on it: served from the cache when
    /// fresh, fetched through the store and cached otherwise.
    pub fn comments(
        &mut self,
        page_id: &str,
        block_id: Option<&str>,
    ) -> Result<Vec<Comment>, ClientError> {
        let key = CacheKey::new(page_id, block_id.map(str::to_string))?;

        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(%key, "comment cache hit");
            return Ok(hit.to_vec());
        }

        let comments = self.store.fetch_comments(page_id, block_id)?;
        self.cache.set(key, comments.clone());
        Ok(comments)
    }

    /// Drop cached comment sets after a local comment edit.
    ///
    /// Both ids narrow to one entry; a page id alone covers the page-level
    /// entry and every block on the page; no page id clears everything (a
    /// block id on its own cannot address a narrower scope).
    pub fn invalidate_comments(
        &mut self,
        page_id: Option<&str>,
        block_id: Option<&str>,
    ) -> Result<(), ClientError> {
        let scope = match (page_id, block_id) {
            (Some(page), Some(block)) => InvalidationScope::Entry(CacheKey::block(page, block)?),
            (Some(page), None) => InvalidationScope::Page(page.to_string()),
            (None, _) => InvalidationScope::All,
        };
        self.cache.invalidate(scope);
        Ok(())
    }

    /// Stage a local block edit, stamped now, awaiting acknowledgment.
    pub fn edit_block(
        &mut self,
        block_id: impl Into<String>,
        kind: impl Into<String>,
        content: Value,
    ) {
        let version = BlockVersion::local(
            block_id,
            kind,
            content,
            now_millis(),
            self.user_id.clone(),
        );
        self.session.stage_local(version);
    }

    /// The store accepted the pending edit for a block.
    pub fn acknowledge_block(&mut self, block_id: &str) {
        self.session.acknowledge(block_id);
    }

    /// Hand back the reconciled version after a manual merge.
    pub fn complete_merge(&mut self, merged: BlockVersion) {
        self.session.complete_merge(merged);
    }

    /// Handle one raw message from the realtime transport.
    ///
    /// Block mutations feed the edit session; a DELETE additionally drops
    /// that block's cached comment set. Collaboration events feed the
    /// presence tracker. Malformed messages are logged and dropped without
    /// disturbing the stream.
    pub fn handle_event(&mut self, raw: &Value) -> EventOutcome {
        let event = match classify(raw) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "dropping malformed realtime event");
                return EventOutcome::Dropped;
            }
        };

        match event {
            RealtimeEvent::BlockMutation(mutation) => {
                if mutation.event_type == BlockEventKind::Delete {
                    // Classification guarantees non-empty ids here.
                    if let Ok(key) =
                        CacheKey::block(&mutation.page_id, &mutation.payload.block_id)
                    {
                        self.cache.invalidate(InvalidationScope::Entry(key));
                    }
                }

                let outcome = self.session.apply_remote(mutation.into_version(), now_millis());
                if let RemoteOutcome::Resolved(record) = &outcome {
                    tracing::info!(
                        block_id = %record.block_id,
                        resolution = ?record.resolution,
                        "reconciled concurrent block edit"
                    );
                }
                EventOutcome::Block(outcome)
            }
            RealtimeEvent::PresenceUpdate(event) => {
                self.presence.apply(&event);
                EventOutcome::Presence
            }
        }
    }

    /// Collaborators currently active on a page.
    pub fn active_collaborators(&self, page_id: &str) -> Vec<&PresenceRecord> {
        self.presence.active_on_page(page_id)
    }

    /// Upload a page's cover image; returns its public URL.
    pub fn upload_cover(
        &self,
        objects: &impl crate::store::ObjectStore,
        page_id: &str,
        bytes: &[u8],
    ) -> Result<String, ClientError> {
        let url = objects.upload(&cover_path(page_id), bytes)?;
        tracing::debug!(page_id, url = %url, "uploaded cover image");
        Ok(url)
    }

    /// Remove a page's cover image.
    pub fn clear_cover(
        &self,
        objects: &impl crate::store::ObjectStore,
        page_id: &str,
    ) -> Result<(), ClientError> {
        objects.delete(&cover_path(page_id))?;
        Ok(())
    }

    /// The underlying edit session (pending edits, heads).
    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// The underlying comment cache.
    pub fn cache(&self) -> &CommentCache {
        &self.cache
    }
}

fn cover_path(page_id: &str) -> String {
    format!("covers/{}", page_id)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
