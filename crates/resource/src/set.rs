//! Ordered, identifier-indexed collection of resources.

use crate::model::Resource;
use std::collections::HashMap;

/// Renderer output for one entrypoint.
///
/// Iteration follows insertion order. Identifiers are unique: inserting a
/// resource whose identifier is already present replaces it in place.
#[derive(Debug, Clone, Default)]
pub struct ResourceSet {
    resources: Vec<Resource>,
    index: HashMap<String, usize>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: Resource) {
        let id = resource.identifier();
        if let Some(&pos) = self.index.get(&id) {
            log::debug!("duplicate resource {id}, keeping the later definition");
            self.resources[pos] = resource;
        } else {
            self.index.insert(id, self.resources.len());
            self.resources.push(resource);
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&Resource> {
        self.index.get(identifier).map(|&pos| &self.resources[pos])
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl FromIterator<Resource> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        let mut set = ResourceSet::new();
        for resource in iter {
            set.insert(resource);
        }
        set
    }
}

impl Extend<Resource> for ResourceSet {
    fn extend<I: IntoIterator<Item = Resource>>(&mut self, iter: I) {
        for resource in iter {
            self.insert(resource);
        }
    }
}

impl IntoIterator for ResourceSet {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResourceSet {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
