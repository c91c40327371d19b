//! # Block Conflict Resolution
//!
//! When a locally pending block edit and a remotely delivered edit target
//! the same block, one side must win or the caller must merge by hand.
//!
//! ## Resolution semantics
//!
//! - `Timestamp`: the later `mutated_at` wins. An exact tie resolves to the
//!   remote side, which the shared store has already accepted.
//! - `UserPriority`: a configured user ranking wins regardless of
//!   timestamps. Missing or equal ranks fall back to the timestamp rule.
//! - `Manual`: never auto-resolves; both versions are surfaced as a merge
//!   for the caller to reconcile.
//!
//! Structurally identical versions short-circuit to a remote no-op before
//! any strategy runs; there is no disagreement to resolve.
//!
//! Resolution is a pure function of its inputs: no I/O, no clocks. The
//! decision timestamp is supplied by the caller.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a block version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionOrigin {
    /// Produced on this client, not yet acknowledged by the store.
    LocalPending,

    /// Delivered by the realtime transport on behalf of another client.
    Remote,
}

/// One side of a potential conflict: a block's state at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockVersion {
    pub block_id: String,

    /// Block type (paragraph, heading, list item, ...). Opaque here.
    #[serde(rename = "type")]
    pub kind: String,

    /// Structural content owned by the editor; this layer only compares it.
    pub content: Value,

    pub origin: VersionOrigin,

    /// Unix millis stamped by whichever side produced the version.
    pub mutated_at: i64,

    pub mutated_by: String,
}

impl BlockVersion {
    /// Build a locally pending version.
    pub fn local(
        block_id: impl Into<String>,
        kind: impl Into<String>,
        content: Value,
        mutated_at: i64,
        mutated_by: impl Into<String>,
    ) -> Self {
        Self {
            block_id: block_id.into(),
            kind: kind.into(),
            content,
            origin: VersionOrigin::LocalPending,
            mutated_at,
            mutated_by: mutated_by.into(),
        }
    }

    /// True when both versions describe the same block state: same block,
    /// same type, same content. Authorship and timestamps are not shape.
    pub fn same_shape(&self, other: &BlockVersion) -> bool {
        self.block_id == other.block_id
            && self.kind == other.kind
            && self.content == other.content
    }
}

/// Which side a resolution kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Local,
    Remote,
    Merge,
}

/// Ranking of users for [`ResolutionStrategy::UserPriority`].
///
/// Lower rank wins. Users without a rank fall back to the timestamp rule.
#[derive(Debug, Clone, Default)]
pub struct UserPriorities {
    ranks: HashMap<String, u32>,
}

impl UserPriorities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rank(mut self, user_id: impl Into<String>, rank: u32) -> Self {
        self.ranks.insert(user_id.into(), rank);
        self
    }

    pub fn rank(&self, user_id: &str) -> Option<u32> {
        self.ranks.get(user_id).copied()
    }
}

/// How competing versions of the same block are reconciled.
#[derive(Debug, Clone, Default)]
pub enum ResolutionStrategy {
    /// Later `mutated_at` wins; exact ties go to the remote side.
    #[default]
    Timestamp,

    /// A configured user ordering wins regardless of timestamps.
    UserPriority(UserPriorities),

    /// Never auto-resolve; surface both versions for the caller.
    Manual,
}

/// Audit record of one resolution decision, handed to the caller for
/// logging or UI surfacing. Not persisted by this layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    pub block_id: String,
    pub local_version: BlockVersion,
    pub remote_version: BlockVersion,
    pub resolution: Resolution,

    /// Unix millis supplied by the caller when the decision was made.
    pub resolved_at: i64,
}

/// Decides between a pending local version and an incoming remote version
/// of the same block.
#[derive(Debug, Clone, Default)]
pub struct ConflictResolver {
    strategy: ResolutionStrategy,
}

impl ConflictResolver {
    pub fn new(strategy: ResolutionStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &ResolutionStrategy {
        &self.strategy
    }

    /// Resolve one conflict. Pure and deterministic: the same inputs always
    /// produce the same record.
    pub fn resolve(
        &self,
        local: BlockVersion,
        remote: BlockVersion,
        resolved_at: i64,
    ) -> ConflictRecord {
        let resolution = if local.same_shape(&remote) {
            // Both sides agree on the block state; the remote copy is
            // already authoritative, so this is a no-op.
            Resolution::Remote
        } else {
            match &self.strategy {
                ResolutionStrategy::Timestamp => Self::by_timestamp(&local, &remote),
                ResolutionStrategy::UserPriority(priorities) => {
                    match (
                        priorities.rank(&local.mutated_by),
                        priorities.rank(&remote.mutated_by),
                    ) {
                        (Some(local_rank), Some(remote_rank)) if local_rank != remote_rank => {
                            if local_rank < remote_rank {
                                Resolution::Local
                            } else {
                                Resolution::Remote
                            }
                        }
                        _ => Self::by_timestamp(&local, &remote),
                    }
                }
                ResolutionStrategy::Manual => Resolution::Merge,
            }
        };

        ConflictRecord {
            block_id: remote.block_id.clone(),
            local_version: local,
            remote_version: remote,
            resolution,
            resolved_at,
        }
    }

    fn by_timestamp(local: &BlockVersion, remote: &BlockVersion) -> Resolution {
        if local.mutated_at > remote.mutated_at {
            Resolution::Local
        } else {
            Resolution::Remote
        }
    }
}
