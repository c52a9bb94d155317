use std::sync::Arc;

use approx::assert_relative_eq;
use nalgebra::{Point1, Point2, Point3, Vector2, U1, U2, U3};

use crate::{
    error::SpaceTreeError,
    primitive::Primitive,
    sampler::Sampler,
    split_policy::{MidpointSplit, WeightedSplit},
    tree::Tree,
};

use super::{counted, EvaluationCounter, SpaceTreeNode, SubdivisionOptions};

type Node2 = SpaceTreeNode<f64, U2, f64>;

fn circle(p: &Point2<f64>) -> f64 {
    p.coords.norm() - 0.5
}

fn root(points_per_dim: usize) -> Node2 {
    SpaceTreeNode::cube(
        Arc::new(Sampler::new(points_per_dim).unwrap()),
        Arc::new(MidpointSplit),
        Point2::new(-1., -1.),
        2.,
    )
    .unwrap()
}

/// Level, cached values and child count of every node in pre-order
fn shape(node: &Node2) -> Vec<(usize, Vec<f64>, usize)> {
    let mut shape = vec![];
    node.visit(|n| {
        shape.push((n.level(), n.values().to_vec(), n.children().len()));
        true
    });
    shape
}

/// Node over the segment [0, 2] sampled at 0, 1 and 2
fn segment(values: [f64; 3]) -> SpaceTreeNode<f64, U1, f64> {
    let mut node = SpaceTreeNode::cube(
        Arc::new(Sampler::new(3).unwrap()),
        Arc::new(MidpointSplit),
        Point1::new(0.),
        2.,
    )
    .unwrap();
    node.evaluate(&|p: &Point1<f64>| values[p.x.round() as usize]).unwrap();
    node
}

#[test]
fn boundary_classification() {
    assert!(segment([1., 1., -1.]).is_boundary());
    assert!(!segment([1., 1., 1.]).is_boundary());
    assert!(!segment([-1., -2., -3.]).is_boundary());
    assert_eq!(segment([1., 1., -1.]).values(), &[1., 1., -1.]);

    let mut single = SpaceTreeNode::<f64, U1, f64>::cube(
        Arc::new(Sampler::center()),
        Arc::new(MidpointSplit),
        Point1::new(0.),
        2.,
    )
    .unwrap();
    single.evaluate(&|_: &Point1<f64>| 1.).unwrap();
    assert_eq!(single.values().len(), 1);
    assert!(!single.is_boundary());
    assert!(!single.divide(&|p: &Point1<f64>| p.x - 1., 5).unwrap());
    assert!((&single).is_leaf());
}

#[test]
fn unevaluated_node_is_not_boundary() {
    let node = root(3);
    assert!(!node.is_evaluated());
    assert!(!node.is_boundary());
}

#[test]
fn depth_zero_only_evaluates() {
    let mut node = root(3);
    assert!(node.divide(&circle, 0).unwrap());
    assert!(node.is_evaluated());
    assert_eq!(node.values().len(), 9);
    assert!(node.children().is_empty());
}

#[test]
fn uniform_node_is_not_divided() {
    let mut node = root(3);
    assert!(!node.divide(&|p: &Point2<f64>| p.x + 10., 4).unwrap());
    assert!(node.children().is_empty());
}

#[test]
fn divides_towards_the_circle() {
    let mut node = root(3);
    assert!(node.divide(&circle, 4).unwrap());
    assert_eq!((&node).depth(), 4);

    node.visit(|n| {
        assert!(n.children().is_empty() || n.children().len() == 4);
        for child in n.children() {
            assert_eq!(child.level(), n.level() + 1);
        }
        // only boundary nodes are split
        if !n.children().is_empty() {
            assert!(n.is_boundary());
        }
        true
    });

    let leaves = node.boundary_leaves();
    assert!(!leaves.is_empty());
    // leaf cells have edge 2 / 2^4, the circle passes through each boundary leaf
    let half_diagonal = 0.125 * 2f64.sqrt() / 2.;
    for leaf in leaves {
        assert_eq!(leaf.level(), 4);
        let distance = leaf.center().coords.norm() - 0.5;
        assert!(distance.abs() <= half_diagonal + 1e-12);
    }
}

#[test]
fn weighted_split_tiles_boxes() {
    let mut node = SpaceTreeNode::<f64, U2, f64>::boxed(
        Arc::new(Sampler::new(4).unwrap()),
        Arc::new(WeightedSplit::default()),
        Point2::new(-1., -0.5),
        Vector2::new(2., 1.5),
    )
    .unwrap();
    let line = |p: &Point2<f64>| p.x - 0.3 * p.y - 0.2;
    assert!(node.divide(&line, 3).unwrap());

    node.visit(|n| {
        if !n.children().is_empty() {
            let volume: f64 = n.children().iter().map(|c| c.primitive().volume()).sum();
            assert_relative_eq!(volume, n.primitive().volume(), epsilon = 1e-12);
            let (lo, hi) = (n.primitive().base(), n.primitive().max());
            for c in n.children() {
                let (clo, chi) = (c.primitive().base(), c.primitive().max());
                for axis in 0..2 {
                    assert!(clo[axis] >= lo[axis] - 1e-12);
                    assert!(chi[axis] <= hi[axis] + 1e-12);
                }
                assert!(c.primitive().volume() > 0.);
            }
        }
        true
    });
}

#[test]
fn wipe_and_rebuild() {
    let mut fresh = root(3);
    fresh.divide(&circle, 4).unwrap();

    let mut rebuilt = root(3);
    rebuilt.divide(&|p: &Point2<f64>| p.coords.norm() - 0.25, 3).unwrap();
    rebuilt.wipe();
    assert!(!rebuilt.is_evaluated());
    assert!(rebuilt.children().is_empty());

    rebuilt.evaluate(&circle).unwrap();
    rebuilt.divide(&circle, 4).unwrap();
    assert_eq!(shape(&fresh), shape(&rebuilt));
}

#[test]
fn redivide_replaces_children() {
    let mut node = root(3);
    node.divide(&circle, 3).unwrap();
    let first = shape(&node);
    node.divide(&circle, 3).unwrap();
    assert_eq!(shape(&node), first);
}

#[test]
fn parallel_matches_sequential() {
    let mut sequential = root(4);
    let mut parallel = root(4);
    assert!(sequential.divide(&circle, 5).unwrap());
    assert!(parallel.par_divide(&circle, 5).unwrap());
    assert_eq!(shape(&sequential), shape(&parallel));

    let mut configured = root(4);
    let options = SubdivisionOptions::default()
        .with_max_depth(5)
        .with_parallel(true);
    configured.subdivide(&circle, &options).unwrap();
    assert_eq!(shape(&sequential), shape(&configured));
}

#[test]
fn counts_evaluations() {
    let counter = EvaluationCounter::new();
    let f = counted(circle, &counter);
    let mut node = root(3);
    node.par_divide(&f, 4).unwrap();
    // every node below a split is divided, so every node is evaluated once
    assert_eq!(counter.count(), (&node).count() * 9);

    counter.reset();
    node.divide(&f, 0).unwrap();
    assert_eq!(counter.count(), 0);
}

#[test]
fn boolean_field() {
    let mut node = SpaceTreeNode::<f64, U2, bool>::cube(
        Arc::new(Sampler::new(2).unwrap()),
        Arc::new(WeightedSplit::default()),
        Point2::new(-1., -1.),
        2.,
    )
    .unwrap();
    let disk = |p: &Point2<f64>| p.coords.norm() < 0.75;
    // corners of the root are all outside, so the disk is never seen
    assert!(!node.divide(&disk, 3).unwrap());

    let half = |p: &Point2<f64>| p.x < 0.1;
    node.wipe();
    assert!(node.divide(&half, 2).unwrap());
    assert_eq!((&node).depth(), 2);
    // the upper right child starts at the center
    assert_relative_eq!(node.children()[3].primitive().base().coords, Vector2::zeros());
}

#[test]
fn oversized_sampler_is_rejected() {
    // (2^22)^3 sample points overflow the index range
    let sampler = Arc::new(Sampler::new(1 << 22).unwrap());
    let err = SpaceTreeNode::<f64, U3, f64>::cube(
        sampler.clone(),
        Arc::new(MidpointSplit),
        Point3::origin(),
        1.,
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SpaceTreeError>(),
        Some(SpaceTreeError::Geometry(_))
    ));

    // nodes built directly fail on evaluation instead
    let primitive = Primitive::cube(Point3::origin(), 1.).unwrap();
    let mut node =
        SpaceTreeNode::<f64, U3, f64>::new(sampler, Arc::new(MidpointSplit), 0, primitive);
    assert!(node.divide(&|p: &Point3<f64>| p.x, 2).is_err());
    assert!(!node.is_evaluated());
}
