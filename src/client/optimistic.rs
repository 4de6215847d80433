use crate::models::{AssetResponse, TaxonomyEntry};
use std::collections::{BTreeMap, HashSet};

/// Entities reconciled by [`OptimisticList`] are matched on this identifier.
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for TaxonomyEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Assets are addressed by storage key, the handle the delete endpoint takes.
impl Identified for AssetResponse {
    fn id(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<T> {
    Create(T),
    Delete(String),
}

pub type MutationId = u64;

/// Server-confirmed entities plus in-flight mutations. [`view`](Self::view)
/// is a pure function of both, so repeated calls agree.
#[derive(Debug, Clone)]
pub struct OptimisticList<T> {
    confirmed: Vec<T>,
    pending: BTreeMap<MutationId, Mutation<T>>,
    next_id: MutationId,
}

impl<T> Default for OptimisticList<T> {
    fn default() -> Self {
        Self {
            confirmed: Vec::new(),
            pending: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Identified + Clone> OptimisticList<T> {
    pub fn new(confirmed: Vec<T>) -> Self {
        Self {
            confirmed,
            ..Self::default()
        }
    }

    pub fn submit(&mut self, mutation: Mutation<T>) -> MutationId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert(id, mutation);
        id
    }

    /// Settles a mutation. For creates, `server_entity` replaces the
    /// provisional one; when absent the provisional entity is kept.
    pub fn confirm(&mut self, mutation_id: MutationId, server_entity: Option<T>) -> bool {
        let Some(mutation) = self.pending.remove(&mutation_id) else {
            return false;
        };

        match mutation {
            Mutation::Create(provisional) => {
                self.upsert_confirmed(server_entity.unwrap_or(provisional));
            }
            Mutation::Delete(id) => {
                self.confirmed.retain(|e| e.id() != id);
            }
        }
        true
    }

    /// Drops a mutation the server rejected, restoring the confirmed view.
    pub fn fail(&mut self, mutation_id: MutationId) -> Option<Mutation<T>> {
        self.pending.remove(&mutation_id)
    }

    pub fn replace_confirmed(&mut self, entities: Vec<T>) {
        self.confirmed = entities;
    }

    pub fn upsert_confirmed(&mut self, entity: T) {
        match self.confirmed.iter_mut().find(|e| e.id() == entity.id()) {
            Some(existing) => *existing = entity,
            None => self.confirmed.push(entity),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Confirmed entities without a pending delete, then provisional creates
    /// in mutation order. The first entity seen for an ID wins, so confirmed
    /// entities shadow provisional ones.
    pub fn view(&self) -> Vec<T> {
        let deleted: HashSet<&str> = self
            .pending
            .values()
            .filter_map(|m| match m {
                Mutation::Delete(id) => Some(id.as_str()),
                Mutation::Create(_) => None,
            })
            .collect();

        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Vec::with_capacity(self.confirmed.len() + self.pending.len());

        let created = self.pending.values().filter_map(|m| match m {
            Mutation::Create(e) => Some(e),
            Mutation::Delete(_) => None,
        });

        for entity in self.confirmed.iter().chain(created) {
            let id = entity.id();
            if deleted.contains(id) || !seen.insert(id) {
                continue;
            }
            out.push(entity.clone());
        }

        out
    }
}
