// Snapshot comparison between consecutive poll cycles

use crate::models::{Record, Snapshot};

/// Records of `current` that are absent from `previous`, in `current` order.
///
/// Membership is a linear structural comparison. Duplicates in `current` are
/// judged one by one, so a record missing from `previous` is reported once per
/// occurrence.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> Vec<Record> {
    current
        .iter()
        .filter(|record| !previous.contains(record))
        .cloned()
        .collect()
}
