//! # Folio Client
//!
//! Session-level glue for the collaborative editor: one [`CollabClient`]
//! per browsing session, owning the comment cache, presence tracker and
//! edit session from `folio-realtime`, and talking to the external
//! collaborators (comment store, identity provider, object storage)
//! through the traits in [`store`].
//!
//! ```rust,ignore
//! use folio_client::{ClientConfig, CollabClient};
//!
//! let mut client = CollabClient::connect(&identity, store, ClientConfig::default())?;
//!
//! // Reads go through the bounded cache.
//! let comments = client.comments("page-1", None)?;
//!
//! // Realtime messages are classified and routed.
//! for raw in transport {
//!     client.handle_event(&raw);
//! }
//! ```

pub mod client;
pub mod store;

pub use client::{ClientConfig, ClientError, CollabClient, EventOutcome};
pub use store::{CommentStore, IdentityProvider, ObjectStore, StoreError};
