use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Vector clock: per-site monotonic counters for causal tracking.
///
/// Missing sites read as zero. Serializes as the plain site->count map;
/// `null` deserializes as the empty clock and explicit zero counts are
/// stripped so logically equal clocks are structurally equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VectorClock(BTreeMap<String, u64>);

impl VectorClock {
    pub fn new() -> Self {
        VectorClock::default()
    }

    /// Raise the given site's counter by one.
    pub fn increment(&mut self, site: &str) {
        *self.0.entry(site.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, site: &str) -> u64 {
        self.0.get(site).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Componentwise max with another clock.
    pub fn merge(&mut self, other: &VectorClock) {
        for (site, &count) in &other.0 {
            let entry = self.0.entry(site.clone()).or_insert(0);
            *entry = (*entry).max(count);
        }
    }

    /// True iff every counter here is <= the other's and at least one is
    /// strictly less. Short-circuits on the first counter that exceeds.
    pub fn happens_before(&self, other: &VectorClock) -> bool {
        let mut strictly_less = false;
        for (site, &a) in &self.0 {
            let b = other.get(site);
            if a > b {
                return false;
            }
            if a < b {
                strictly_less = true;
            }
        }
        // Sites only the other clock knows about count as 0 < b here.
        strictly_less
            || other
                .0
                .iter()
                .any(|(site, &b)| b > 0 && !self.0.contains_key(site))
    }

    pub fn concurrent(&self, other: &VectorClock) -> bool {
        !self.happens_before(other) && !other.happens_before(self) && self != other
    }
}

impl<'de> Deserialize<'de> for VectorClock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut map = Option::<BTreeMap<String, u64>>::deserialize(deserializer)?
            .unwrap_or_default();
        map.retain(|_, count| *count > 0);
        Ok(VectorClock(map))
    }
}
