/// Options for subdividing a `SpaceTreeNode`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubdivisionOptions {
    /// Number of levels below the node that may be created
    pub max_depth: usize,
    /// Refine sibling subtrees on the rayon thread pool
    pub parallel: bool,
}

impl Default for SubdivisionOptions {
    fn default() -> Self {
        Self {
            max_depth: 6,
            parallel: false,
        }
    }
}

impl SubdivisionOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
