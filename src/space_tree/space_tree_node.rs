use std::sync::Arc;

use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint, OVector};
use rayon::prelude::*;

use crate::{
    misc::{FieldValue, FloatingPoint},
    primitive::Primitive,
    sampler::Sampler,
    split_policy::SplitPolicy,
    tree::Tree,
};

use super::SubdivisionOptions;

/// Node of an adaptive tree refining towards the boundary of an implicit function.
///
/// A node samples the target function with its `Sampler`. When the samples lie on both
/// sides of the surface, the node splits into `2^D` children at the point chosen by its
/// `SplitPolicy`, and the children are refined in turn until the depth budget runs out.
/// Sampler and split policy are shared by every node of the tree.
/// # Example
/// ```
/// use std::sync::Arc;
/// use nalgebra::{Point2, U2};
/// use spacetree::prelude::*;
///
/// let mut root = SpaceTreeNode::<f64, U2, f64>::cube(
///     Arc::new(Sampler::new(3).unwrap()),
///     Arc::new(MidpointSplit),
///     Point2::new(-1., -1.),
///     2.,
/// )
/// .unwrap();
/// let circle = |p: &Point2<f64>| p.coords.norm() - 0.5;
/// assert!(root.divide(&circle, 3).unwrap());
/// assert_eq!((&root).depth(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct SpaceTreeNode<T: FloatingPoint, D: DimName, V: FieldValue>
where
    DefaultAllocator: Allocator<D>,
{
    primitive: Primitive<T, D>,
    level: usize,
    values: Vec<V>,
    children: Vec<Self>,
    sampler: Arc<Sampler>,
    split_policy: Arc<dyn SplitPolicy<T, D, V>>,
}

impl<T: FloatingPoint, D: DimName, V: FieldValue> SpaceTreeNode<T, D, V>
where
    DefaultAllocator: Allocator<D>,
{
    pub fn new(
        sampler: Arc<Sampler>,
        split_policy: Arc<dyn SplitPolicy<T, D, V>>,
        level: usize,
        primitive: Primitive<T, D>,
    ) -> Self {
        Self {
            primitive,
            level,
            values: vec![],
            children: vec![],
            sampler,
            split_policy,
        }
    }

    /// Create a root node over a cube.
    /// Fails if the sampler grid does not fit in D space.
    pub fn cube(
        sampler: Arc<Sampler>,
        split_policy: Arc<dyn SplitPolicy<T, D, V>>,
        base: OPoint<T, D>,
        length: T,
    ) -> anyhow::Result<Self> {
        sampler.size::<D>()?;
        Ok(Self::new(
            sampler,
            split_policy,
            0,
            Primitive::cube(base, length)?,
        ))
    }

    /// Create a root node over a box.
    pub fn boxed(
        sampler: Arc<Sampler>,
        split_policy: Arc<dyn SplitPolicy<T, D, V>>,
        base: OPoint<T, D>,
        lengths: OVector<T, D>,
    ) -> anyhow::Result<Self> {
        sampler.size::<D>()?;
        Ok(Self::new(
            sampler,
            split_policy,
            0,
            Primitive::boxed(base, lengths)?,
        ))
    }

    pub fn primitive(&self) -> &Primitive<T, D> {
        &self.primitive
    }

    /// Depth of the node, 0 at the root
    pub fn level(&self) -> usize {
        self.level
    }

    /// Cached target function values, one per sample point
    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn children(&self) -> &[Self] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Self] {
        &mut self.children
    }

    pub fn sampler(&self) -> &Arc<Sampler> {
        &self.sampler
    }

    pub fn split_policy(&self) -> &Arc<dyn SplitPolicy<T, D, V>> {
        &self.split_policy
    }

    pub fn center(&self) -> OPoint<T, D> {
        self.primitive.center()
    }

    pub fn is_evaluated(&self) -> bool {
        !self.values.is_empty()
    }

    /// Sample the target function at every sample point, replacing cached values.
    pub fn evaluate<F>(&mut self, f: &F) -> anyhow::Result<()>
    where
        F: Fn(&OPoint<T, D>) -> V,
    {
        let values = self
            .sampler
            .sample_points(&self.primitive)?
            .map(|p| f(&p))
            .collect();
        self.values = values;
        Ok(())
    }

    /// Check if the sampled values lie on both sides of the surface.
    /// A node with fewer than two values is never a boundary node.
    pub fn is_boundary(&self) -> bool {
        match self.values.split_first() {
            Some((first, rest)) => {
                let side = first.is_inside();
                rest.iter().any(|v| v.is_inside() != side)
            }
            None => false,
        }
    }

    /// Split the node at `point` into `2^D` unevaluated children, replacing existing ones.
    pub fn split(&mut self, point: &OPoint<T, D>) -> anyhow::Result<()> {
        let primitives = self.primitive.split(point)?;
        if !self.children.is_empty() {
            log::warn!(
                "re-splitting a node at level {} discards its {} children",
                self.level,
                self.children.len()
            );
        }
        self.children = primitives
            .into_iter()
            .map(|primitive| {
                Self::new(
                    self.sampler.clone(),
                    self.split_policy.clone(),
                    self.level + 1,
                    primitive,
                )
            })
            .collect();
        Ok(())
    }

    /// Refine the node towards the boundary of `f`, at most `depth` levels deep.
    ///
    /// Returns whether this node is a boundary node.
    pub fn divide<F>(&mut self, f: &F, depth: usize) -> anyhow::Result<bool>
    where
        F: Fn(&OPoint<T, D>) -> V,
    {
        let boundary = self.refine(f, depth)?;
        if boundary && depth > 0 {
            for child in self.children.iter_mut() {
                child.divide(f, depth - 1)?;
            }
        }
        Ok(boundary)
    }

    /// Same as `divide`, refining the children of every split node in parallel.
    pub fn par_divide<F>(&mut self, f: &F, depth: usize) -> anyhow::Result<bool>
    where
        F: Fn(&OPoint<T, D>) -> V + Sync,
        Self: Send,
    {
        let boundary = self.refine(f, depth)?;
        if boundary && depth > 0 {
            self.children
                .par_iter_mut()
                .try_for_each(|child| child.par_divide(f, depth - 1).map(|_| ()))?;
        }
        Ok(boundary)
    }

    /// Refine with the depth and scheduling given by `options`.
    pub fn subdivide<F>(&mut self, f: &F, options: &SubdivisionOptions) -> anyhow::Result<bool>
    where
        F: Fn(&OPoint<T, D>) -> V + Sync,
        Self: Send,
    {
        log::debug!(
            "subdividing from level {} to depth {} ({})",
            self.level,
            options.max_depth,
            if options.parallel {
                "parallel"
            } else {
                "sequential"
            }
        );
        if options.parallel {
            self.par_divide(f, options.max_depth)
        } else {
            self.divide(f, options.max_depth)
        }
    }

    /// Evaluate if needed and split when this is a boundary node with depth left.
    fn refine<F>(&mut self, f: &F, depth: usize) -> anyhow::Result<bool>
    where
        F: Fn(&OPoint<T, D>) -> V,
    {
        if !self.is_evaluated() {
            self.evaluate(f)?;
        }
        let boundary = self.is_boundary();
        if boundary && depth > 0 {
            let point = self
                .split_policy
                .split_point(&self.primitive, &self.sampler, &self.values);
            self.split(&point)?;
            log::trace!(
                "split level {} at {:?}",
                self.level,
                point.coords.as_slice()
            );
        }
        Ok(boundary)
    }

    /// Drop children and cached values, returning the node to its unevaluated state.
    pub fn wipe(&mut self) {
        for child in self.children.iter_mut() {
            child.wipe();
        }
        self.children.clear();
        self.values.clear();
    }

    /// Leaves straddling the surface
    pub fn boundary_leaves(&self) -> Vec<&Self> {
        self.leaves()
            .into_iter()
            .filter(|node| node.is_boundary())
            .collect()
    }
}

impl<'a, T: FloatingPoint, D: DimName, V: FieldValue> Tree for &'a SpaceTreeNode<T, D, V>
where
    DefaultAllocator: Allocator<D>,
{
    fn children(self) -> impl Iterator<Item = Self> {
        self.children.iter()
    }
}
