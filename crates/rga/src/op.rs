use serde::{Deserialize, Serialize};

use crate::pid::Pid;
use crate::vclock::VectorClock;

/// Insert operation: `op_id` is the new cell's pid, `pos_id` the pid of
/// the cell it follows (`None` for the document root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOp {
    pub site_id: String,
    pub pos_id: Option<Pid>,
    #[serde(rename = "char")]
    pub value: String,
    pub op_id: Pid,
}

/// Compound identity of a delete: the same target may be deleted by
/// several sites, so the deleter and its clock snapshot are part of the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOpId {
    pub target: Pid,
    pub deleter_site: String,
    #[serde(default)]
    pub vclock: VectorClock,
}

/// Delete operation: tombstones the cell with id `target_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOp {
    pub site_id: String,
    pub target_id: Pid,
    pub op_id: DeleteOpId,
}

/// Operation as delivered to the applier, local or remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOp {
    Insert(InsertOp),
    Delete(DeleteOp),
}

impl RemoteOp {
    /// Canonical key identifying this operation in the seen-set.
    pub fn key(&self) -> String {
        match self {
            RemoteOp::Insert(op) => canonical_json(&op.op_id),
            RemoteOp::Delete(op) => canonical_json(&op.op_id),
        }
    }
}

impl From<InsertOp> for RemoteOp {
    fn from(op: InsertOp) -> Self {
        RemoteOp::Insert(op)
    }
}

impl From<DeleteOp> for RemoteOp {
    fn from(op: DeleteOp) -> Self {
        RemoteOp::Delete(op)
    }
}

/// Canonical JSON encoding: keys sorted lexicographically at every level,
/// so equal logical values produce byte-identical strings. Routing through
/// `serde_json::Value` gives the sorted-key form, its object map is ordered.
pub fn canonical_json<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .expect("operation ids serialize to JSON")
        .to_string()
}
