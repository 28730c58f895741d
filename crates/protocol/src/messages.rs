// Peer-to-peer message types. One JSON object per line, dispatched on the
// "type" field; a line never contains a raw newline.

use rga::{Cell, DeleteOp, InsertOp, RemoteOp};
use serde::{Deserialize, Serialize};

/// Everything a peer may send: the two replicated operations plus the
/// anti-entropy handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// A character insertion, local to some site and fanned out to peers.
    Insert(InsertOp),

    /// A tombstoning delete.
    Delete(DeleteOp),

    /// Sent by the initiator right after a link is established.
    SyncRequest { site_id: String },

    /// Full replica snapshot in document order, answering a sync_request.
    SyncResponse { site_id: String, snapshot: Vec<Cell> },
}

impl Message {
    /// The replicated operation carried by this message, if any.
    pub fn into_op(self) -> Option<RemoteOp> {
        match self {
            Message::Insert(op) => Some(RemoteOp::Insert(op)),
            Message::Delete(op) => Some(RemoteOp::Delete(op)),
            _ => None,
        }
    }
}

impl From<RemoteOp> for Message {
    fn from(op: RemoteOp) -> Self {
        match op {
            RemoteOp::Insert(op) => Message::Insert(op),
            RemoteOp::Delete(op) => Message::Delete(op),
        }
    }
}
