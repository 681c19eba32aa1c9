//! Compiled view store.
//!
//! A store is built in full by one load and then published as a unit; entries
//! are never evicted or merged individually.

use std::collections::HashMap;
use std::sync::Arc;

use crate::compiler::CompiledTemplate;

/// Lookup table from template name to compiled view.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: HashMap<String, Arc<CompiledTemplate>>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, template: CompiledTemplate) {
        self.templates
            .insert(template.name().to_string(), Arc::new(template));
    }

    /// Shared handle to a compiled view, usable after the store lock is released.
    pub fn get(&self, name: &str) -> Option<Arc<CompiledTemplate>> {
        self.templates.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Sorted template names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.templates.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
