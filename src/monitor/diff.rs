use bytes::Bytes;

use crate::store::Snapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Change {
    Added(String, Bytes),
    Updated(String, Bytes),
    Deleted(String),
}

/// Changes that turn `old` into `new`: adds and updates in key order, then
/// deletes in key order.
pub(crate) fn diff(old: &Snapshot, new: &Snapshot) -> Vec<Change> {
    let mut changes = Vec::new();
    for (path, data) in new {
        match old.get(path) {
            None => changes.push(Change::Added(path.clone(), data.clone())),
            Some(previous) if previous != data => {
                changes.push(Change::Updated(path.clone(), data.clone()));
            }
            Some(_) => {}
        }
    }
    changes.extend(
        old.keys()
            .filter(|path| !new.contains_key(*path))
            .map(|path| Change::Deleted(path.clone())),
    );
    changes
}
