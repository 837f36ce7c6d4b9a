use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::key::Key;
use crate::provider::{Provider, SharedProvider};

/// The immutable registration table backing one container level.
///
/// Entries of one target type are kept in registration order, so that
/// resolve-all hands implementations back in the order the host declared
/// them.
#[derive(Debug, Default)]
pub struct ProviderMap {
    providers: HashMap<TypeId, ProviderSlot>,
}

impl ProviderMap {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Inserts an entry, replacing and returning any previous entry with
    /// the same key.
    pub fn insert(&mut self, entry: ProviderEntry) -> Option<ProviderEntry> {
        let target = entry.dyn_key().target_type();
        if let Some(slot) = self.providers.get_mut(&target) {
            slot.insert(entry)
        } else {
            self.providers.insert(target, ProviderSlot::Single(entry));
            None
        }
    }

    pub fn get(&self, key: &dyn Key) -> Option<&ProviderEntry> {
        self.providers
            .get(&key.target_type())
            .and_then(|slot| slot.get(key))
    }

    pub fn contains(&self, key: &dyn Key) -> bool {
        self.get(key).is_some()
    }

    /// The keys of every entry targeting `target`, in registration order.
    pub fn keys(&self, target: TypeId) -> Vec<Box<dyn Key>> {
        match self.providers.get(&target) {
            Some(ProviderSlot::Single(entry)) => vec![entry.dyn_key().dyn_clone()],
            Some(ProviderSlot::Many(entries)) => entries
                .iter()
                .map(|entry| entry.dyn_key().dyn_clone())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.providers
            .values()
            .map(|slot| match slot {
                ProviderSlot::Single(_) => 1,
                ProviderSlot::Many(entries) => entries.len(),
            })
            .sum()
    }
}

#[derive(Debug)]
enum ProviderSlot {
    Single(ProviderEntry),
    Many(Vec<ProviderEntry>),
}

impl ProviderSlot {
    fn insert(&mut self, entry: ProviderEntry) -> Option<ProviderEntry> {
        match self {
            Self::Single(existing) if existing.dyn_key() == entry.dyn_key() => {
                Some(std::mem::replace(existing, entry))
            }
            Self::Single(_) => {
                let Self::Single(existing) = std::mem::replace(self, Self::Many(Vec::new())) else {
                    unreachable!("`self` should match `Self::Single(_)`")
                };
                let Self::Many(entries) = self else {
                    unreachable!("`self` should already be assigned to `Self::Many(_)`")
                };
                entries.push(existing);
                entries.push(entry);
                None
            }
            Self::Many(entries) => {
                let position = entries
                    .iter()
                    .position(|existing| existing.dyn_key() == entry.dyn_key());
                match position {
                    Some(position) => Some(std::mem::replace(&mut entries[position], entry)),
                    None => {
                        entries.push(entry);
                        None
                    }
                }
            }
        }
    }

    fn get(&self, key: &dyn Key) -> Option<&ProviderEntry> {
        match self {
            Self::Single(entry) if entry.dyn_key() == key => Some(entry),
            Self::Single(_) => None,
            Self::Many(entries) => entries.iter().find(|entry| entry.dyn_key() == key),
        }
    }
}

/// One registration: a key plus the provider constructing its objects.
/// `Shared` entries can be cached at the owning level, `Owned` entries are
/// rebuilt on every resolution.
#[derive(Debug)]
pub enum ProviderEntry {
    Shared {
        key: Box<dyn Key>,
        provider: Arc<dyn SharedProvider>,
    },
    Owned {
        key: Box<dyn Key>,
        provider: Arc<dyn Provider>,
    },
}

impl ProviderEntry {
    pub fn new_shared(key: Box<dyn Key>, provider: Arc<dyn SharedProvider>) -> Self {
        Self::Shared { key, provider }
    }

    pub fn new_owned(key: Box<dyn Key>, provider: Arc<dyn Provider>) -> Self {
        Self::Owned { key, provider }
    }

    pub fn dyn_key(&self) -> &dyn Key {
        match self {
            Self::Shared { key, .. } => key.as_ref(),
            Self::Owned { key, .. } => key.as_ref(),
        }
    }
}
