/// Options for partitioning an `AABBTree`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartitionOptions {
    /// A node holding at most this many objects is not subdivided
    pub max_objects: usize,
    /// Nodes at this level are never subdivided, regardless of their object count
    pub max_level: usize,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            max_objects: 8,
            max_level: 8,
        }
    }
}

impl PartitionOptions {
    pub fn with_max_objects(mut self, max_objects: usize) -> Self {
        self.max_objects = max_objects;
        self
    }

    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.max_level = max_level;
        self
    }
}
