//TODO: swap the linear scan for a hashed set if edges start carrying hundreds of templates.

#[derive(Debug, Clone, PartialEq)]
/// Insertion-ordered set of reaction or template evidence on one edge.
/// Membership is by equality, duplicates are never stored twice.
pub struct EvidenceSet<E> {
    items: Vec<E>,
}

impl<E> Default for EvidenceSet<E> {
    fn default() -> Self {
        EvidenceSet { items: Vec::new() }
    }
}

impl<E: PartialEq> EvidenceSet<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set holding exactly one item.
    pub fn singleton(item: E) -> Self {
        EvidenceSet { items: vec![item] }
    }

    /// Rebuild from serialized items, dropping repeats.
    pub fn from_items(items: Vec<E>) -> Self {
        let mut set = Self::new();
        for item in items {
            set.insert(item);
        }
        set
    }

    /// Insert an item if it has not been observed yet.
    /// Returns `true` when the set grew.
    pub fn insert(&mut self, item: E) -> bool {
        if self.items.contains(&item) {
            false
        } else {
            self.items.push(item);
            true
        }
    }

    pub fn contains(&self, item: &E) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&E> {
        self.items.first()
    }
}
