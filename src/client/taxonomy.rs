use crate::client::optimistic::{Mutation, MutationId, OptimisticList};
use crate::models::TaxonomyEntry;
use crate::utils::slug::slugify;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyKind {
    Tag,
    Category,
    Subcategory,
}

/// Optimistic state for the taxonomy editor: one reducer per kind.
#[derive(Debug, Default)]
pub struct TaxonomyBoard {
    lists: HashMap<TaxonomyKind, OptimisticList<TaxonomyEntry>>,
}

impl TaxonomyBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn list_mut(&mut self, kind: TaxonomyKind) -> &mut OptimisticList<TaxonomyEntry> {
        self.lists.entry(kind).or_default()
    }

    /// Replaces the server-confirmed entries of `kind`, e.g. after a fetch.
    pub fn load(&mut self, kind: TaxonomyKind, entries: Vec<TaxonomyEntry>) {
        self.list_mut(kind).replace_confirmed(entries);
    }

    /// Shows a provisional entry right away. The returned ID settles it via
    /// [`confirm`](Self::confirm) or [`fail`](Self::fail).
    pub fn create(
        &mut self,
        kind: TaxonomyKind,
        name: &str,
        category_id: Option<String>,
    ) -> MutationId {
        let provisional = TaxonomyEntry {
            id: format!("provisional-{}", Uuid::new_v4()),
            name: name.trim().to_string(),
            slug: slugify(name),
            category_id: category_id.filter(|_| kind == TaxonomyKind::Subcategory),
        };
        self.list_mut(kind).submit(Mutation::Create(provisional))
    }

    pub fn remove(&mut self, kind: TaxonomyKind, id: &str) -> MutationId {
        self.list_mut(kind).submit(Mutation::Delete(id.to_string()))
    }

    pub fn confirm(
        &mut self,
        kind: TaxonomyKind,
        mutation_id: MutationId,
        server_entry: Option<TaxonomyEntry>,
    ) -> bool {
        self.list_mut(kind).confirm(mutation_id, server_entry)
    }

    pub fn fail(&mut self, kind: TaxonomyKind, mutation_id: MutationId) -> bool {
        self.list_mut(kind).fail(mutation_id).is_some()
    }

    pub fn view(&self, kind: TaxonomyKind) -> Vec<TaxonomyEntry> {
        self.lists.get(&kind).map(|l| l.view()).unwrap_or_default()
    }

    pub fn subcategories_of(&self, category_id: &str) -> Vec<TaxonomyEntry> {
        self.view(TaxonomyKind::Subcategory)
            .into_iter()
            .filter(|s| s.category_id.as_deref() == Some(category_id))
            .collect()
    }
}
