//! Object Selection Set
//!
//! The objects the operator has chosen. Replaced wholesale on every
//! selection event; there is no incremental add/remove.

use std::collections::HashSet;
use std::sync::Arc;

use crate::object::{DatabaseObject, NormalizedObjectClass, ObjectId};

/// Ordered set of selected objects, unique by id.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    objects: Vec<Arc<DatabaseObject>>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection, keeping the first occurrence of each id.
    pub fn from_objects(objects: impl IntoIterator<Item = Arc<DatabaseObject>>) -> Self {
        let mut seen = HashSet::new();
        let objects = objects
            .into_iter()
            .filter(|obj| seen.insert(obj.id))
            .collect();
        Self { objects }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<DatabaseObject>> {
        self.objects.iter()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.iter().any(|obj| obj.id == id)
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|obj| obj.id).collect()
    }

    /// Distinct normalized classes, in first-seen selection order.
    pub fn classes(&self) -> Vec<NormalizedObjectClass> {
        let mut seen = HashSet::new();
        self.objects
            .iter()
            .map(|obj| obj.normalized_class())
            .filter(|class| seen.insert(*class))
            .collect()
    }

    /// Owned copies for request payloads.
    pub fn to_objects(&self) -> Vec<DatabaseObject> {
        self.objects.iter().map(|obj| obj.as_ref().clone()).collect()
    }
}
