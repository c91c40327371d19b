//! # Folio Realtime
//!
//! Client-side consistency layer for collaborative page editing.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ transport: ordered per-page event messages  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ events: classify → block | presence         │
//! └─────────────────────────────────────────────┘
//!            ↓                     ↓
//! ┌──────────────────────┐ ┌──────────────────┐
//! │ session + conflict:  │ │ presence:        │
//! │ pending local edits  │ │ cursor, typing,  │
//! │ vs remote versions   │ │ staleness        │
//! └──────────────────────┘ └──────────────────┘
//!
//! ┌─────────────────────────────────────────────┐
//! │ cache: TTL + capacity bounded comment sets  │
//! │ keyed per page or per block                 │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core principles
//!
//! 1. **The store is authoritative**: remote versions have already been
//!    accepted; local edits are optimistic and may lose.
//! 2. **Arrival order is applied order**: the transport delivers per-page
//!    order; this layer never re-sorts by embedded timestamp.
//! 3. **Bounded state**: the comment cache and presence maps are capped by
//!    age and by size; nothing grows without limit.
//! 4. **Synchronous and deterministic**: no I/O, no internal clocks in the
//!    resolver, every operation runs to completion.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_realtime::{
//!     classify, CommentCache, ConflictResolver, EditSession, PresenceTracker,
//!     RealtimeEvent, ResolutionStrategy,
//! };
//!
//! let mut cache = CommentCache::new();
//! let mut presence = PresenceTracker::new();
//! let mut session = EditSession::new(
//!     "me",
//!     ConflictResolver::new(ResolutionStrategy::Timestamp),
//! );
//!
//! match classify(&raw_message)? {
//!     RealtimeEvent::BlockMutation(m) => {
//!         let outcome = session.apply_remote(m.into_version(), now_millis);
//!     }
//!     RealtimeEvent::PresenceUpdate(e) => presence.apply(&e),
//! }
//! ```

mod cache;
mod conflict;
mod errors;
mod events;
mod key;
mod presence;
mod session;

pub use cache::{CacheConfig, Comment, CommentCache, InvalidationScope};
pub use conflict::{
    BlockVersion, ConflictRecord, ConflictResolver, Resolution, ResolutionStrategy,
    UserPriorities, VersionOrigin,
};
pub use errors::RealtimeError;
pub use events::{
    classify, BlockEventKind, BlockMutation, BlockPayload, CollaborationEvent, RealtimeEvent,
};
pub use key::{CacheKey, KEY_SEPARATOR};
pub use presence::{CursorPosition, PresenceConfig, PresenceRecord, PresenceTracker};
pub use session::{EditSession, RemoteOutcome};
