//! # Page Edit Session
//!
//! One client's pending block edits and their reconciliation against
//! remotely delivered versions.
//!
//! Per block the session holds at most one locally pending version (an
//! optimistic edit awaiting store acknowledgment) and at most one head:
//! the last version applied from the transport or acknowledged locally.
//! Feeding a remote version in consumes the pair: either the remote applies
//! directly, or the resolver decides, or, under the manual strategy, both
//! versions are surfaced until the caller completes the merge.
//!
//! Remote versions are applied in arrival order; the transport is trusted
//! to deliver per-page order. Re-delivery of the version already applied is
//! tolerated as a no-op.

use std::collections::HashMap;

use crate::conflict::{
    BlockVersion, ConflictRecord, ConflictResolver, Resolution, VersionOrigin,
};

/// Outcome of feeding a remote block version into the session.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome {
    /// No pending local edit for the block; the remote version applied
    /// as-is.
    Applied(BlockVersion),

    /// The same version was already applied; nothing changed.
    Duplicate,

    /// A pending local edit competed with the remote version. The record
    /// says which side won, or that a manual merge is required.
    Resolved(ConflictRecord),
}

/// Tracks pending local edits per block and reconciles remote arrivals.
pub struct EditSession {
    user_id: String,
    resolver: ConflictResolver,

    /// Optimistic local edits awaiting acknowledgment, one per block.
    pending: HashMap<String, BlockVersion>,

    /// Last version applied per block (remote, acknowledged, or merged).
    heads: HashMap<String, BlockVersion>,
}

impl EditSession {
    pub fn new(user_id: impl Into<String>, resolver: ConflictResolver) -> Self {
        Self {
            user_id: user_id.into(),
            resolver,
            pending: HashMap::new(),
            heads: HashMap::new(),
        }
    }

    /// The user this session edits as.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Record a local edit awaiting acknowledgment, replacing any earlier
    /// pending edit for the same block.
    pub fn stage_local(&mut self, mut version: BlockVersion) {
        version.origin = VersionOrigin::LocalPending;
        self.pending.insert(version.block_id.clone(), version);
    }

    /// The store accepted the pending edit for a block: it becomes the
    /// block's head.
    pub fn acknowledge(&mut self, block_id: &str) {
        if let Some(version) = self.pending.remove(block_id) {
            self.heads.insert(block_id.to_string(), version);
        }
    }

    /// Feed one remote version into the session, in arrival order.
    ///
    /// `now` is the wall-clock stamp (unix millis) recorded on any
    /// resulting [`ConflictRecord`].
    pub fn apply_remote(&mut self, remote: BlockVersion, now: i64) -> RemoteOutcome {
        // At-least-once transport: re-applying the applied version is a
        // no-op.
        if self.heads.get(&remote.block_id) == Some(&remote) {
            return RemoteOutcome::Duplicate;
        }

        let Some(local) = self.pending.remove(&remote.block_id) else {
            self.heads.insert(remote.block_id.clone(), remote.clone());
            return RemoteOutcome::Applied(remote);
        };

        let record = self.resolver.resolve(local, remote, now);

        // Whichever side won, the remote copy is the latest known remote
        // state for the block.
        self.heads
            .insert(record.block_id.clone(), record.remote_version.clone());

        match record.resolution {
            Resolution::Remote => {}
            // The local edit survives: pending re-assertion against the
            // store, or a manual merge via complete_merge.
            Resolution::Local | Resolution::Merge => {
                self.pending
                    .insert(record.block_id.clone(), record.local_version.clone());
            }
        }

        RemoteOutcome::Resolved(record)
    }

    /// Hand back the reconciled version after a manual merge; it becomes
    /// the block's new pending edit.
    pub fn complete_merge(&mut self, merged: BlockVersion) {
        self.stage_local(merged);
    }

    /// The pending local edit for a block, if any.
    pub fn pending(&self, block_id: &str) -> Option<&BlockVersion> {
        self.pending.get(block_id)
    }

    /// The last applied version for a block, if any.
    pub fn head(&self, block_id: &str) -> Option<&BlockVersion> {
        self.heads.get(block_id)
    }

    /// Number of blocks with unacknowledged local edits.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::ResolutionStrategy;
    use serde_json::json;

    fn session(strategy: ResolutionStrategy) -> EditSession {
        EditSession::new("me", ConflictResolver::new(strategy))
    }

    fn remote(block: &str, mutated_at: i64, by: &str, text: &str) -> BlockVersion {
        BlockVersion {
            block_id: block.to_string(),
            kind: "paragraph".to_string(),
            content: json!({ "text": text }),
            origin: VersionOrigin::Remote,
            mutated_at,
            mutated_by: by.to_string(),
        }
    }

    #[test]
    fn test_remote_applies_directly_without_pending() {
        let mut session = session(ResolutionStrategy::Timestamp);
        let incoming = remote("b1", 10, "other", "their edit");

        let outcome = session.apply_remote(incoming.clone(), 100);

        assert_eq!(outcome, RemoteOutcome::Applied(incoming.clone()));
        assert_eq!(session.head("b1"), Some(&incoming));
        assert_eq!(session.pending_count(), 0);
    }

    #[test]
    fn test_duplicate_delivery_is_noop() {
        let mut session = session(ResolutionStrategy::Timestamp);
        let incoming = remote("b1", 10, "other", "their edit");

        session.apply_remote(incoming.clone(), 100);
        let outcome = session.apply_remote(incoming, 101);

        assert_eq!(outcome, RemoteOutcome::Duplicate);
    }

    #[test]
    fn test_remote_win_drops_pending() {
        let mut session = session(ResolutionStrategy::Timestamp);
        session.stage_local(BlockVersion::local(
            "b1",
            "paragraph",
            json!({"text": "mine"}),
            10,
            "me",
        ));

        let outcome = session.apply_remote(remote("b1", 12, "userC", "theirs"), 100);

        let RemoteOutcome::Resolved(record) = outcome else {
            panic!("expected a resolution");
        };
        assert_eq!(record.resolution, Resolution::Remote);
        assert_eq!(session.pending_count(), 0);
        assert_eq!(session.head("b1").unwrap().mutated_by, "userC");
    }

    #[test]
    fn test_local_win_keeps_edit_pending() {
        let mut session = session(ResolutionStrategy::Timestamp);
        session.stage_local(BlockVersion::local(
            "b1",
            "paragraph",
            json!({"text": "mine"}),
            20,
            "me",
        ));

        let outcome = session.apply_remote(remote("b1", 12, "userC", "theirs"), 100);

        let RemoteOutcome::Resolved(record) = outcome else {
            panic!("expected a resolution");
        };
        assert_eq!(record.resolution, Resolution::Local);

        // The losing remote version is still the latest known remote head.
        assert_eq!(session.head("b1").unwrap().mutated_by, "userC");
        assert_eq!(session.pending("b1").unwrap().mutated_by, "me");
    }

    #[test]
    fn test_manual_merge_lifecycle() {
        let mut session = session(ResolutionStrategy::Manual);
        session.stage_local(BlockVersion::local(
            "b1",
            "paragraph",
            json!({"text": "mine"}),
            10,
            "me",
        ));

        let outcome = session.apply_remote(remote("b1", 12, "other", "theirs"), 100);
        let RemoteOutcome::Resolved(record) = outcome else {
            panic!("expected a resolution");
        };
        assert_eq!(record.resolution, Resolution::Merge);

        // Both sides stay visible for the UI.
        assert!(session.pending("b1").is_some());
        assert!(session.head("b1").is_some());

        let merged = BlockVersion::local(
            "b1",
            "paragraph",
            json!({"text": "mine + theirs"}),
            13,
            "me",
        );
        session.complete_merge(merged);

        assert_eq!(
            session.pending("b1").unwrap().content,
            json!({"text": "mine + theirs"})
        );
    }

    #[test]
    fn test_stage_local_replaces_earlier_pending() {
        let mut session = session(ResolutionStrategy::Timestamp);
        session.stage_local(BlockVersion::local("b1", "paragraph", json!({}), 1, "me"));
        session.stage_local(BlockVersion::local(
            "b1",
            "paragraph",
            json!({"text": "v2"}),
            2,
            "me",
        ));

        assert_eq!(session.pending_count(), 1);
        assert_eq!(session.pending("b1").unwrap().mutated_at, 2);
    }

    #[test]
    fn test_acknowledge_promotes_pending_to_head() {
        let mut session = session(ResolutionStrategy::Timestamp);
        session.stage_local(BlockVersion::local(
            "b1",
            "paragraph",
            json!({"text": "mine"}),
            5,
            "me",
        ));

        session.acknowledge("b1");

        assert_eq!(session.pending_count(), 0);
        assert_eq!(session.head("b1").unwrap().mutated_by, "me");
    }

    #[test]
    fn test_acknowledge_unknown_block_is_noop() {
        let mut session = session(ResolutionStrategy::Timestamp);
        session.acknowledge("nope");
        assert_eq!(session.pending_count(), 0);
        assert!(session.head("nope").is_none());
    }
}
