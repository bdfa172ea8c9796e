use std::{
    collections::{hash_map::Entry, HashMap},
    fmt,
    io::{Result, Write},
};

use crate::median::RunningMedian;

/// The secondary dimension a set of groups is keyed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grouping {
    Zip,
    Date,
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grouping::Zip => write!(f, "zip"),
            Grouping::Date => write!(f, "date"),
        }
    }
}

/// Recipient plus sub-key. The derived ordering sorts by recipient, then
/// by the raw sub-key string.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub recipient: String,
    pub sub_key: String,
}

impl GroupKey {
    pub fn new(recipient: &str, sub_key: &str) -> GroupKey {
        GroupKey {
            recipient: recipient.to_string(),
            sub_key: sub_key.to_string(),
        }
    }
}

/// The statistics of one group at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub median: i64,
    pub count: usize,
    pub total: i128,
}

impl Snapshot {
    pub fn of(tracker: &RunningMedian) -> Snapshot {
        Snapshot {
            median: tracker.median(),
            count: tracker.count(),
            total: tracker.total(),
        }
    }

    pub fn write(&self, out: &mut dyn Write, key: &GroupKey) -> Result<()> {
        writeln!(
            out,
            "{}|{}|{}|{}|{}",
            key.recipient, key.sub_key, self.median, self.count, self.total
        )
    }
}

pub struct Aggregator {
    grouping: Grouping,
    groups: HashMap<GroupKey, RunningMedian>,
}

impl Aggregator {
    pub fn new(grouping: Grouping) -> Aggregator {
        Aggregator {
            grouping,
            groups: HashMap::new(),
        }
    }

    pub fn grouping(&self) -> Grouping {
        self.grouping
    }

    /// Adds `amount` to the group for `key`, starting the group if this is
    /// its first amount, and returns the group's updated tracker.
    pub fn record(&mut self, key: GroupKey, amount: i64) -> &RunningMedian {
        match self.groups.entry(key) {
            Entry::Occupied(entry) => {
                let tracker = entry.into_mut();
                tracker.insert(amount);
                tracker
            }
            Entry::Vacant(entry) => entry.insert(RunningMedian::new(amount)),
        }
    }

    pub fn snapshot(&self, key: &GroupKey) -> Option<Snapshot> {
        self.groups.get(key).map(Snapshot::of)
    }

    pub fn sorted_keys(&self) -> Vec<&GroupKey> {
        let mut keys: Vec<&GroupKey> = self.groups.keys().collect();
        keys.sort();
        keys
    }

    /// Writes one line per group, in key order.
    pub fn write_sorted(&self, out: &mut dyn Write) -> Result<usize> {
        let keys = self.sorted_keys();
        for key in keys.iter() {
            if let Some(snap) = self.snapshot(key) {
                snap.write(out, key)?;
            }
        }
        Ok(keys.len())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
