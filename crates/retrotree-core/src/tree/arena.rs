use crate::tree::ids::NodeId;

/// Dense node storage. Ids are handed out in insertion order and never reused.
#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    storage: Vec<T>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena {
            storage: Vec::new(),
        }
    }

    /// Rebuild an arena from items already laid out by id.
    pub fn from_vec(storage: Vec<T>) -> Self {
        Arena { storage }
    }

    /// Allocate a new item and return its id
    pub fn allocate(&mut self, item: T) -> NodeId {
        let id = NodeId::from(self.storage.len());
        self.storage.push(item);
        id
    }

    /// The id the next allocation will receive.
    pub fn next_id(&self) -> NodeId {
        NodeId::from(self.storage.len())
    }

    pub fn get(&self, node_id: NodeId) -> Option<&T> {
        self.storage.get(node_id.index())
    }

    pub fn get_mut(&mut self, node_id: NodeId) -> Option<&mut T> {
        self.storage.get_mut(node_id.index())
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Iterate `(NodeId, &T)` pairs in id order.
    pub fn enumerate(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.storage
            .iter()
            .enumerate()
            .map(|(idx, item)| (NodeId::from(idx), item))
    }
}
