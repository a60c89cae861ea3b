/*!
Pending changes recorded between property writes and the next reconcile.
*/

use crate::core::service::key::DeclarationKey;

/// One property write affecting the property-derived service tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    /// A declaration was stored or overwritten
    Put { key: DeclarationKey, value: String },
    /// A declaration was removed
    Remove { key: DeclarationKey },
    /// Every property was dropped
    Clear,
}

impl PendingChange {
    /// Change for `key = value`, or `None` when the key declares nothing
    pub fn put(key: &str, value: &str) -> Option<Self> {
        DeclarationKey::parse(key).map(|key| PendingChange::Put {
            key,
            value: value.to_string(),
        })
    }

    /// Change for the removal of `key`, or `None` when the key declared nothing
    pub fn remove(key: &str) -> Option<Self> {
        DeclarationKey::parse(key).map(|key| PendingChange::Remove { key })
    }
}
