/// Traversal shared by every tree in the crate.
///
/// Implemented by cheap node handles (`&SpaceTreeNode`, `&Cell`, `AABBoxNodeRef`),
/// so the provided methods can hand out nodes by value.
pub trait Tree: Copy {
    /// Direct children of the node in split order.
    fn children(self) -> impl Iterator<Item = Self>;

    fn is_leaf(self) -> bool {
        self.children().next().is_none()
    }

    /// Pre-order depth first traversal starting at this node.
    ///
    /// Returning `false` from the callback skips the subtree below that node,
    /// siblings and the rest of the traversal are still visited.
    /// # Example
    /// ```
    /// use nalgebra::{Point2, U2};
    /// use spacetree::prelude::*;
    /// let mut cell = Cell::new(Primitive::<f64, U2>::cube(Point2::origin(), 1.).unwrap());
    /// cell.split(&Point2::new(0.5, 0.5)).unwrap();
    /// let mut visited = 0;
    /// (&cell).visit(|_| {
    ///     visited += 1;
    ///     true
    /// });
    /// assert_eq!(visited, 5);
    /// ```
    fn visit<F: FnMut(Self) -> bool>(self, mut callback: F) {
        visit_node(self, &mut callback);
    }

    /// Collect every leaf below (or at) this node.
    fn leaves(self) -> Vec<Self> {
        let mut leaves = vec![];
        self.visit(|node| {
            if node.is_leaf() {
                leaves.push(node);
            }
            true
        });
        leaves
    }

    /// Number of nodes in the subtree, this node included.
    fn count(self) -> usize {
        let mut count = 0;
        self.visit(|_| {
            count += 1;
            true
        });
        count
    }

    /// Number of edges on the longest path down to a leaf.
    fn depth(self) -> usize {
        self.children()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

fn visit_node<N: Tree, F: FnMut(N) -> bool>(node: N, callback: &mut F) {
    if callback(node) {
        for child in node.children() {
            visit_node(child, callback);
        }
    }
}
