use std::sync::Arc;

use indexmap::IndexMap;
use tracing::warn;

use crate::operation::Operation;

/// Operations of one named category, in registration order.
#[derive(Debug, Clone)]
pub struct OperationCategory {
    pub name: String,
    pub operations: Vec<Arc<dyn Operation>>,
}

/// Index of every operation the shell can run, keyed by operation id.
///
/// Operations may be grouped into named categories for display. Registering
/// an id that already exists replaces the earlier entry everywhere, so the
/// last registration wins.
#[derive(Debug, Default, Clone)]
pub struct OperationRegistry {
    operations: IndexMap<String, Arc<dyn Operation>>,
    categories: IndexMap<String, Vec<String>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, category: &str, operation: Arc<dyn Operation>) {
        let id = operation.id().to_string();
        if self.operations.insert(id.clone(), operation).is_some() {
            warn!(operation = %id, category, "Operation registered twice; keeping the last registration");
            for ids in self.categories.values_mut() {
                ids.retain(|existing| existing != &id);
            }
        }
        self.categories.entry(category.to_string()).or_default().push(id);
    }

    pub fn register_category<I>(&mut self, category: &str, operations: I)
    where
        I: IntoIterator<Item = Arc<dyn Operation>>,
    {
        for operation in operations {
            self.register(category, operation);
        }
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<dyn Operation>> {
        self.operations.get(id).cloned()
    }

    /// Every operation, sorted by id.
    pub fn list_all(&self) -> Vec<Arc<dyn Operation>> {
        let mut all: Vec<_> = self.operations.values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    /// Every operation id, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Categories in registration order. Empty categories are skipped.
    pub fn list_categories(&self) -> Vec<OperationCategory> {
        self.categories
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(name, ids)| OperationCategory {
                name: name.clone(),
                operations: ids.iter().filter_map(|id| self.lookup(id)).collect(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
