use std::sync::{Arc, Weak};

use itertools::Itertools;
use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint};

use crate::{error::SpaceTreeError, misc::FloatingPoint, tree::Tree};

use super::{AABBox, Boundable, PartitionOptions};

/// Handle to a node stored in an `AABBTree`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Node of an `AABBTree`
///
/// Objects are referenced weakly and split into the ones fully contained by the node's box
/// and the ones only intersecting it.
#[derive(Debug)]
pub struct AABBoxNode<T: FloatingPoint, D: DimName, O>
where
    DefaultAllocator: Allocator<D>,
{
    aabb: AABBox<T, D>,
    level: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    contained: Vec<Weak<O>>,
    intersected: Vec<Weak<O>>,
}

impl<T: FloatingPoint, D: DimName, O> AABBoxNode<T, D, O>
where
    DefaultAllocator: Allocator<D>,
    O: Boundable<T, D>,
{
    fn new(aabb: AABBox<T, D>, level: usize, parent: Option<NodeId>) -> Self {
        Self {
            aabb,
            level,
            parent,
            children: vec![],
            contained: vec![],
            intersected: vec![],
        }
    }

    pub fn aabb(&self) -> &AABBox<T, D> {
        &self.aabb
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// The parent node, `None` for the root
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn contained(&self) -> &[Weak<O>] {
        &self.contained
    }

    pub fn intersected(&self) -> &[Weak<O>] {
        &self.intersected
    }

    /// Number of listed objects, expired ones included
    pub fn object_count(&self) -> usize {
        self.contained.len() + self.intersected.len()
    }

    /// Live objects listed by this node
    pub fn objects(&self) -> impl Iterator<Item = Arc<O>> + '_ {
        self.contained
            .iter()
            .chain(self.intersected.iter())
            .filter_map(Weak::upgrade)
    }

    /// Check if the object is listed as contained or intersected
    pub fn lists(&self, object: &Weak<O>) -> bool {
        self.contained
            .iter()
            .chain(self.intersected.iter())
            .any(|o| Weak::ptr_eq(o, object))
    }

    /// Record the object in the matching list, if it overlaps the node at all.
    fn classify(&mut self, aabb: &AABBox<T, D>, object: &Weak<O>) {
        if self.lists(object) {
            return;
        }
        if self.aabb.contains(aabb) {
            self.contained.push(object.clone());
        } else if self.aabb.intersects(aabb) {
            self.intersected.push(object.clone());
        }
    }
}

/// A tree of axis aligned boxes indexing externally owned objects.
///
/// Nodes live in an arena, parents are referenced by `NodeId` so a child never owns its parent.
/// The tree only keeps `Weak` references, objects dropped by their owners become expired
/// and are removed by `erase_expired`.
/// # Example
/// ```
/// use std::sync::Arc;
/// use nalgebra::{Point2, Vector2};
/// use spacetree::prelude::*;
///
/// let root = AABBox::new(Point2::new(0., 0.), Vector2::new(1., 1.)).unwrap();
/// let mut tree = AABBTree::new(root);
/// let objects: Vec<_> = (0..4)
///     .map(|i| {
///         let x = i as f64 * 0.25 + 0.05;
///         Arc::new(AABBox::new(Point2::new(x, 0.05), Vector2::new(0.1, 0.1)).unwrap())
///     })
///     .collect();
/// objects.iter().for_each(|o| tree.add_object(o));
/// assert!(tree.partition(1, 4));
/// let leaf = tree.find(&Arc::downgrade(&objects[0])).unwrap().unwrap();
/// assert!(tree.node(leaf).unwrap().children().is_empty());
/// ```
#[derive(Debug)]
pub struct AABBTree<T: FloatingPoint, D: DimName, O>
where
    DefaultAllocator: Allocator<D>,
{
    nodes: Vec<AABBoxNode<T, D, O>>,
}

impl<T: FloatingPoint, D: DimName, O> AABBTree<T, D, O>
where
    DefaultAllocator: Allocator<D>,
    O: Boundable<T, D>,
{
    /// Create a tree with a single empty root node covering `aabb`.
    pub fn new(aabb: AABBox<T, D>) -> Self {
        Self {
            nodes: vec![AABBoxNode::new(aabb, 0, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&AABBoxNode<T, D, O>> {
        self.nodes.get(id.0)
    }

    /// Traversable handle to a node
    pub fn node_ref(&self, id: NodeId) -> Option<AABBoxNodeRef<'_, T, D, O>> {
        self.nodes
            .get(id.0)
            .map(|_| AABBoxNodeRef { tree: self, id })
    }

    pub fn root_ref(&self) -> AABBoxNodeRef<'_, T, D, O> {
        AABBoxNodeRef {
            tree: self,
            id: self.root(),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Register an object with every node it is contained in or intersects.
    pub fn add_object(&mut self, object: &Arc<O>) {
        let aabb = object.bounding_box();
        let weak = Arc::downgrade(object);
        self.walk_mut(|tree, id| {
            tree.nodes[id.0].classify(&aabb, &weak);
            true
        });
    }

    /// Partition with limits taken from `options`.
    pub fn partition_with(&mut self, options: &PartitionOptions) -> bool {
        self.partition(options.max_objects, options.max_level)
    }

    /// Recursively subdivide nodes holding more than `max_objects` objects.
    ///
    /// Any previous partition is discarded, the root keeps its objects and every
    /// other node derives its contained and intersected objects from its parent.
    /// Returns `false` if some node hit `max_level` while still over the object limit.
    /// Node ids obtained before the call are invalidated.
    pub fn partition(&mut self, max_objects: usize, max_level: usize) -> bool {
        self.nodes.truncate(1);
        if let Some(root) = self.nodes.first_mut() {
            root.children.clear();
        }

        let mut achieved = true;
        self.walk_mut(|tree, id| {
            if let Some(parent) = tree.nodes[id.0].parent {
                tree.inherit(parent, id);
            }

            let node = &tree.nodes[id.0];
            if node.object_count() <= max_objects {
                return false;
            }
            if node.level >= max_level {
                log::warn!(
                    "node at level {} still holds {} objects (limit {})",
                    node.level,
                    node.object_count(),
                    max_objects
                );
                achieved = false;
                return false;
            }

            tree.subdivide(id);
            true
        });

        log::debug!(
            "partitioned into {} nodes, object limit {}",
            self.nodes.len(),
            if achieved { "achieved" } else { "not achieved" }
        );
        achieved
    }

    /// Fit every node's box to the objects it lists.
    ///
    /// Nodes without live objects collapse to zero lengths at their lower corner.
    /// Otherwise the box becomes the bounds of the contained objects
    /// and of the parts of intersected objects lying inside the node.
    pub fn shrink(&mut self) {
        self.walk_mut(|tree, id| {
            let node = &mut tree.nodes[id.0];
            let contained = node
                .contained
                .iter()
                .filter_map(Weak::upgrade)
                .map(|o| o.bounding_box());
            let intersected = node
                .intersected
                .iter()
                .filter_map(Weak::upgrade)
                .filter_map(|o| node.aabb.intersection(&o.bounding_box()));
            let bounds = contained.chain(intersected).reduce(|mut acc, b| {
                acc.include(&b);
                acc
            });
            match bounds {
                Some(bounds) => node.aabb = bounds,
                None => node.aabb.collapse(),
            }
            true
        });
    }

    /// Find the deepest node listing the object.
    ///
    /// The first listing leaf wins. An object listed by no leaf (a flat box lying on a
    /// split plane is dropped by every child) resolves to the deepest inner node listing it.
    /// Branches whose root does not list the object are skipped.
    /// Fails with `SpaceTreeError::ExpiredObject` if the object has been dropped.
    pub fn find(&self, object: &Weak<O>) -> anyhow::Result<Option<NodeId>> {
        if object.strong_count() == 0 {
            return Err(SpaceTreeError::ExpiredObject.into());
        }

        let mut deepest: Option<(usize, NodeId)> = None;
        let mut at_leaf = false;
        self.root_ref().visit(|node| {
            if at_leaf || !node.node().lists(object) {
                return false;
            }
            let level = node.node().level;
            if node.is_leaf() {
                deepest = Some((level, node.id()));
                at_leaf = true;
                return false;
            }
            if deepest.map_or(true, |(deepest, _)| level > deepest) {
                deepest = Some((level, node.id()));
            }
            true
        });
        Ok(deepest.map(|(_, id)| id))
    }

    /// Deepest node whose box contains the point.
    pub fn find_leaf(&self, point: &OPoint<T, D>) -> Option<NodeId> {
        let mut deepest: Option<(usize, NodeId)> = None;
        self.root_ref().visit(|node| {
            let inner = node.node();
            if !inner.aabb.contains_point(point) {
                return false;
            }
            if deepest.map_or(true, |(level, _)| inner.level > level) {
                deepest = Some((inner.level, node.id()));
            }
            true
        });
        deepest.map(|(_, id)| id)
    }

    /// Live objects whose boxes overlap `aabb`, each reported once.
    pub fn query(&self, aabb: &AABBox<T, D>) -> Vec<Arc<O>> {
        let mut hits = vec![];
        self.root_ref().visit(|node| {
            let inner = node.node();
            if !inner.aabb.overlaps(aabb) {
                return false;
            }
            // inner nodes may list objects none of their children kept
            hits.extend(inner.objects().filter(|o| o.bounding_box().overlaps(aabb)));
            true
        });
        hits.into_iter()
            .unique_by(|o| Arc::as_ptr(o) as usize)
            .collect()
    }

    /// Drop expired references from every node.
    pub fn erase_expired(&mut self) {
        self.walk_mut(|tree, id| {
            let node = &mut tree.nodes[id.0];
            node.contained.retain(|o| o.strong_count() > 0);
            node.intersected.retain(|o| o.strong_count() > 0);
            true
        });
    }

    /// Mutable pre-order walk from the root.
    ///
    /// Children are read after the callback returns, so nodes created by the callback are walked too.
    fn walk_mut<F>(&mut self, mut callback: F)
    where
        F: FnMut(&mut Self, NodeId) -> bool,
    {
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            if callback(self, id) {
                stack.extend(self.nodes[id.0].children.iter().rev().copied());
            }
        }
    }

    /// Re-derive a node's objects from its parent's lists.
    fn inherit(&mut self, parent: NodeId, id: NodeId) {
        let objects = self.nodes[parent.0]
            .contained
            .iter()
            .chain(self.nodes[parent.0].intersected.iter())
            .filter_map(|o| o.upgrade().map(|strong| (strong.bounding_box(), o.clone())))
            .collect_vec();

        let node = &mut self.nodes[id.0];
        node.contained.clear();
        node.intersected.clear();
        for (aabb, object) in objects {
            node.classify(&aabb, &object);
        }
    }

    /// Split a node at its center into `2^D` children.
    fn subdivide(&mut self, id: NodeId) {
        let (tiles, level) = {
            let node = &self.nodes[id.0];
            (node.aabb.tiles(&node.aabb.center()), node.level)
        };
        let first = self.nodes.len();
        let children = (first..first + tiles.len()).map(NodeId).collect_vec();
        self.nodes.extend(
            tiles
                .into_iter()
                .map(|aabb| AABBoxNode::new(aabb, level + 1, Some(id))),
        );
        self.nodes[id.0].children = children;
    }
}

/// Borrowed handle to a node, used for traversal.
pub struct AABBoxNodeRef<'a, T: FloatingPoint, D: DimName, O>
where
    DefaultAllocator: Allocator<D>,
{
    tree: &'a AABBTree<T, D, O>,
    id: NodeId,
}

impl<'a, T: FloatingPoint, D: DimName, O> AABBoxNodeRef<'a, T, D, O>
where
    DefaultAllocator: Allocator<D>,
{
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'a AABBoxNode<T, D, O> {
        &self.tree.nodes[self.id.0]
    }
}

impl<T: FloatingPoint, D: DimName, O> Clone for AABBoxNodeRef<'_, T, D, O>
where
    DefaultAllocator: Allocator<D>,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: FloatingPoint, D: DimName, O> Copy for AABBoxNodeRef<'_, T, D, O> where
    DefaultAllocator: Allocator<D>
{
}

impl<T: FloatingPoint, D: DimName, O> Tree for AABBoxNodeRef<'_, T, D, O>
where
    DefaultAllocator: Allocator<D>,
{
    fn children(self) -> impl Iterator<Item = Self> {
        let tree = self.tree;
        self.node()
            .children
            .iter()
            .map(move |&id| AABBoxNodeRef { tree, id })
    }
}
