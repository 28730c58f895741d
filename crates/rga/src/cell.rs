use serde::{Deserialize, Serialize};

use crate::pid::Pid;

/// One character of the document plus its metadata.
///
/// `value` holds a single user-level character; multi-codepoint graphemes
/// are stored whole, never split. `id` and `parent` are immutable once the
/// cell exists; `deleted` only ever transitions false -> true (tombstone).
/// A `parent` of `None` anchors the cell at the document root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub value: String,
    pub id: Pid,
    pub parent: Option<Pid>,
    #[serde(default)]
    pub deleted: bool,
}

impl Cell {
    pub fn new(value: impl Into<String>, id: Pid, parent: Option<Pid>) -> Self {
        Cell {
            value: value.into(),
            id,
            parent,
            deleted: false,
        }
    }
}
