//! # Realtime Event Model
//!
//! Inbound transport messages normalized into a closed set of shapes.
//!
//! Two families arrive on the wire, distinguished by their discriminator
//! field:
//!
//! - **Block mutations** carry `eventType` (`INSERT` | `UPDATE` | `DELETE`),
//!   a block payload, the acting user and a timestamp.
//! - **Collaboration events** carry `type` (`cursor_move`, `typing_start`,
//!   `typing_stop`, `user_join`, `user_leave`), each variant with only the
//!   fields it needs.
//!
//! [`classify`] turns a raw JSON message into a [`RealtimeEvent`] or an
//! error the caller logs and drops. Classification never panics and never
//! stalls the stream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::conflict::{BlockVersion, VersionOrigin};
use crate::presence::CursorPosition;
use crate::RealtimeError;

/// Kind of block mutation carried by a realtime message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlockEventKind {
    Insert,
    Update,
    Delete,
}

/// Wire payload of a block mutation: the block's new state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPayload {
    pub block_id: String,

    #[serde(rename = "type")]
    pub kind: String,

    /// Structural content, opaque to this layer.
    #[serde(default)]
    pub content: Value,
}

/// A block changed on another client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMutation {
    pub event_type: BlockEventKind,
    pub page_id: String,
    pub payload: BlockPayload,
    pub user_id: String,

    /// Unix millis stamped by the producing client.
    pub timestamp: i64,
}

impl BlockMutation {
    /// Shape checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), RealtimeError> {
        if self.page_id.is_empty() {
            return Err(RealtimeError::MissingPageId);
        }
        if self.payload.block_id.is_empty() {
            return Err(RealtimeError::MissingBlockId);
        }
        if self.user_id.is_empty() {
            return Err(RealtimeError::MissingUserId);
        }
        Ok(())
    }

    /// Convert the wire payload into a remote [`BlockVersion`].
    pub fn into_version(self) -> BlockVersion {
        BlockVersion {
            block_id: self.payload.block_id,
            kind: self.payload.kind,
            content: self.payload.content,
            origin: VersionOrigin::Remote,
            mutated_at: self.timestamp,
            mutated_by: self.user_id,
        }
    }
}

/// Collaboration traffic: cursor and typing activity, joins and leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollaborationEvent {
    #[serde(rename_all = "camelCase")]
    CursorMove {
        user_id: String,
        page_id: String,
        cursor: CursorPosition,
    },

    #[serde(rename_all = "camelCase")]
    TypingStart { user_id: String, page_id: String },

    #[serde(rename_all = "camelCase")]
    TypingStop { user_id: String, page_id: String },

    #[serde(rename_all = "camelCase")]
    UserJoin { user_id: String, page_id: String },

    #[serde(rename_all = "camelCase")]
    UserLeave { user_id: String, page_id: String },
}

impl CollaborationEvent {
    pub fn user_id(&self) -> &str {
        match self {
            CollaborationEvent::CursorMove { user_id, .. }
            | CollaborationEvent::TypingStart { user_id, .. }
            | CollaborationEvent::TypingStop { user_id, .. }
            | CollaborationEvent::UserJoin { user_id, .. }
            | CollaborationEvent::UserLeave { user_id, .. } => user_id,
        }
    }

    pub fn page_id(&self) -> &str {
        match self {
            CollaborationEvent::CursorMove { page_id, .. }
            | CollaborationEvent::TypingStart { page_id, .. }
            | CollaborationEvent::TypingStop { page_id, .. }
            | CollaborationEvent::UserJoin { page_id, .. }
            | CollaborationEvent::UserLeave { page_id, .. } => page_id,
        }
    }

    pub fn validate(&self) -> Result<(), RealtimeError> {
        if self.page_id().is_empty() {
            return Err(RealtimeError::MissingPageId);
        }
        if self.user_id().is_empty() {
            return Err(RealtimeError::MissingUserId);
        }
        Ok(())
    }
}

/// A normalized inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    BlockMutation(BlockMutation),
    PresenceUpdate(CollaborationEvent),
}

/// Normalize one raw transport message.
///
/// Block mutations are identified by their `eventType` discriminator,
/// collaboration events by their `type` tag. Anything else, including a
/// message with the right discriminator but a shape or ids that do not
/// hold up, is rejected for the caller to log and drop.
pub fn classify(raw: &Value) -> Result<RealtimeEvent, RealtimeError> {
    if raw.get("eventType").is_some() {
        let mutation: BlockMutation = serde_json::from_value(raw.clone())
            .map_err(|e| RealtimeError::UnrecognizedEvent(e.to_string()))?;
        mutation.validate()?;
        return Ok(RealtimeEvent::BlockMutation(mutation));
    }

    if raw.get("type").is_some() {
        let event: CollaborationEvent = serde_json::from_value(raw.clone())
            .map_err(|e| RealtimeError::UnrecognizedEvent(e.to_string()))?;
        event.validate()?;
        return Ok(RealtimeEvent::PresenceUpdate(event));
    }

    Err(RealtimeError::UnrecognizedEvent(
        "missing event discriminator".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_block_mutation() {
        let raw = json!({
            "eventType": "UPDATE",
            "pageId": "p1",
            "payload": {
                "blockId": "b1",
                "type": "paragraph",
                "content": {"text": "hello"}
            },
            "userId": "u1",
            "timestamp": 42
        });

        match classify(&raw).unwrap() {
            RealtimeEvent::BlockMutation(mutation) => {
                assert_eq!(mutation.event_type, BlockEventKind::Update);
                assert_eq!(mutation.page_id, "p1");
                assert_eq!(mutation.payload.block_id, "b1");
                assert_eq!(mutation.timestamp, 42);
            }
            other => panic!("expected block mutation, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_collaboration_event() {
        let raw = json!({
            "type": "cursor_move",
            "userId": "u1",
            "pageId": "p1",
            "cursor": {"blockId": "b1", "offset": 3}
        });

        match classify(&raw).unwrap() {
            RealtimeEvent::PresenceUpdate(CollaborationEvent::CursorMove {
                user_id,
                cursor,
                ..
            }) => {
                assert_eq!(user_id, "u1");
                assert_eq!(cursor.offset, 3);
                assert!(cursor.selection_end.is_none());
            }
            other => panic!("expected cursor move, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_all_collaboration_variants() {
        for kind in ["typing_start", "typing_stop", "user_join", "user_leave"] {
            let raw = json!({"type": kind, "userId": "u1", "pageId": "p1"});
            assert!(
                matches!(classify(&raw), Ok(RealtimeEvent::PresenceUpdate(_))),
                "variant {} should classify",
                kind
            );
        }
    }

    #[test]
    fn test_classify_rejects_unknown_shape() {
        let raw = json!({"kind": "mystery", "pageId": "p1"});
        assert!(matches!(
            classify(&raw),
            Err(RealtimeError::UnrecognizedEvent(_))
        ));
    }

    #[test]
    fn test_classify_rejects_unknown_collaboration_type() {
        let raw = json!({"type": "wave_hello", "userId": "u1", "pageId": "p1"});
        assert!(matches!(
            classify(&raw),
            Err(RealtimeError::UnrecognizedEvent(_))
        ));
    }

    #[test]
    fn test_classify_rejects_empty_ids() {
        let raw = json!({
            "eventType": "DELETE",
            "pageId": "",
            "payload": {"blockId": "b1", "type": "paragraph"},
            "userId": "u1",
            "timestamp": 1
        });
        assert_eq!(classify(&raw), Err(RealtimeError::MissingPageId));

        let raw = json!({"type": "user_join", "userId": "", "pageId": "p1"});
        assert_eq!(classify(&raw), Err(RealtimeError::MissingUserId));
    }

    #[test]
    fn test_block_mutation_serialization_round_trip() {
        let mutation = BlockMutation {
            event_type: BlockEventKind::Insert,
            page_id: "p1".to_string(),
            payload: BlockPayload {
                block_id: "b1".to_string(),
                kind: "heading".to_string(),
                content: json!({"text": "Title", "level": 2}),
            },
            user_id: "u1".to_string(),
            timestamp: 7,
        };

        let json = serde_json::to_string(&mutation).unwrap();
        let deserialized: BlockMutation = serde_json::from_str(&json).unwrap();

        assert_eq!(mutation, deserialized);
    }

    #[test]
    fn test_into_version_marks_origin_remote() {
        let raw = json!({
            "eventType": "UPDATE",
            "pageId": "p1",
            "payload": {"blockId": "b1", "type": "paragraph", "content": {"text": "x"}},
            "userId": "userC",
            "timestamp": 12
        });

        let RealtimeEvent::BlockMutation(mutation) = classify(&raw).unwrap() else {
            panic!("expected block mutation");
        };
        let version = mutation.into_version();

        assert_eq!(version.origin, VersionOrigin::Remote);
        assert_eq!(version.mutated_at, 12);
        assert_eq!(version.mutated_by, "userC");
    }
}
