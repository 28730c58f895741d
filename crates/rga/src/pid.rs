use serde::{Deserialize, Serialize};

use crate::vclock::VectorClock;

/// Position identifier: a vector-clock snapshot plus the minting site.
///
/// Globally unique by construction (a site increments its own counter
/// before minting). The total order is causal first, then lexicographic
/// on the site id for concurrent clocks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pid {
    pub vclock: VectorClock,
    pub site: String,
}

impl Pid {
    pub fn new(vclock: VectorClock, site: impl Into<String>) -> Self {
        Pid {
            vclock,
            site: site.into(),
        }
    }

    /// Total-order comparison:
    /// 1. if this clock happens-before the other's, this pid is earlier;
    /// 2. if the other's happens-before this one's, it is later;
    /// 3. otherwise (concurrent or equal clocks) the site id decides.
    pub fn precedes(&self, other: &Pid) -> bool {
        if self.vclock.happens_before(&other.vclock) {
            return true;
        }
        if other.vclock.happens_before(&self.vclock) {
            return false;
        }
        self.site < other.site
    }
}

impl PartialOrd for Pid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        if self.precedes(other) {
            std::cmp::Ordering::Less
        } else if other.precedes(self) {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    }
}
