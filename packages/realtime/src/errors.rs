//! Error types for the realtime core

use thiserror::Error;

/// Errors produced by the consistency layer.
///
/// Cache, presence and resolver operations are total over valid input, so
/// everything here is either a caller precondition violation or an inbound
/// message the classifier refused. None of these are transient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RealtimeError {
    #[error("page id must not be empty")]
    MissingPageId,

    #[error("block id must not be empty")]
    MissingBlockId,

    #[error("user id must not be empty")]
    MissingUserId,

    #[error("unrecognized event shape: {0}")]
    UnrecognizedEvent(String),
}
