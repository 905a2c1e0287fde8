use std::collections::BTreeMap;

use radarsync_common::{DropObserver, DropReason};
use serde::Serialize;

/// Counts silent drops per reason.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DropCounters {
    counts: BTreeMap<DropReason, u64>,
}

impl DropCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, reason: DropReason) -> u64 {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Non-zero counts in reason order.
    pub fn iter(&self) -> impl Iterator<Item = (DropReason, u64)> + '_ {
        self.counts.iter().map(|(reason, count)| (*reason, *count))
    }
}

impl DropObserver for DropCounters {
    fn on_drop(&mut self, reason: DropReason) {
        *self.counts.entry(reason).or_default() += 1;
    }
}

impl std::fmt::Display for DropCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Drops: total={}", self.total())?;
        for (reason, count) in self.iter() {
            write!(f, " {reason}={count}")?;
        }
        Ok(())
    }
}
