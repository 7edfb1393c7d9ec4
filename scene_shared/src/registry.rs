//! Scene object registry.
//!
//! Maps client-visible `ObjectId`s to host entity handles. The registry owns
//! the mapping only; entity lifetime belongs to the scene host.

use std::collections::HashMap;

use crate::{
    config::IdStrategy,
    error::RegistryError,
    host::EntityHandle,
    protocol::ObjectId,
};

#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<ObjectId, EntityHandle>,
    strategy: IdStrategy,
    /// Successful inserts over the registry's lifetime.
    issued: u64,
}

impl Registry {
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            entries: HashMap::new(),
            strategy,
            issued: 0,
        }
    }

    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    /// The id the next create would use. Does not reserve it.
    ///
    /// Under `RegistrySize` the id is the current entry count, advanced to
    /// the next free decimal id while that one is still live.
    pub fn next_id(&self) -> ObjectId {
        match self.strategy {
            IdStrategy::Monotonic => ObjectId::from(self.issued),
            IdStrategy::RegistrySize => {
                let mut n = self.entries.len() as u64;
                while self.entries.contains_key(n.to_string().as_str()) {
                    n += 1;
                }
                ObjectId::from(n)
            }
        }
    }

    /// Adds an entry. An occupied key is refused and the registry is left
    /// untouched.
    pub fn insert(&mut self, id: ObjectId, handle: EntityHandle) -> Result<(), RegistryError> {
        if self.entries.contains_key(&id) {
            return Err(RegistryError::Occupied(id));
        }
        self.entries.insert(id, handle);
        self.issued += 1;
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<EntityHandle> {
        self.entries.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Removes the entry if present and returns its handle.
    pub fn remove(&mut self, id: &str) -> Option<EntityHandle> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted numerically where possible, for stable listings.
    pub fn sorted(&self) -> Vec<(&ObjectId, EntityHandle)> {
        let mut out: Vec<_> = self.entries.iter().map(|(k, v)| (k, *v)).collect();
        out.sort_by(|(a, _), (b, _)| {
            match (a.as_str().parse::<u64>(), b.as_str().parse::<u64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => a.cmp(b),
            }
        });
        out
    }

    /// Drops every entry and returns the handles that were held.
    pub fn clear(&mut self) -> Vec<EntityHandle> {
        self.entries.drain().map(|(_, h)| h).collect()
    }
}
