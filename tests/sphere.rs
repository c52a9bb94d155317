use std::sync::Arc;

use nalgebra::{Point3, U3};
use spacetree::prelude::{
    counted, EvaluationCounter, MidpointSplit, Sampler, SpaceTreeNode, SubdivisionOptions, Tree,
    WeightedSplit,
};

fn sphere(p: &Point3<f64>) -> f64 {
    p.coords.norm_squared() - 0.25
}

fn root() -> SpaceTreeNode<f64, U3, f64> {
    SpaceTreeNode::cube(
        Arc::new(Sampler::new(5).unwrap()),
        Arc::new(MidpointSplit),
        Point3::new(-2., -2., -2.),
        4.,
    )
    .unwrap()
}

#[test]
fn test_sphere_boundary() {
    let mut node = root();
    assert!(node.par_divide(&sphere, 6).unwrap());
    assert!(node.is_boundary());
    assert_eq!((&node).depth(), 6);

    // leaves at level 6 have edge 4 / 2^6
    let half_diagonal = 0.0625 * 3f64.sqrt() / 2.;
    let boundary = node.boundary_leaves();
    assert!(!boundary.is_empty());
    for leaf in boundary {
        assert_eq!(leaf.level(), 6);
        let distance = leaf.center().coords.norm() - 0.5;
        assert!(distance.abs() <= half_diagonal + 1e-9);
    }

    // leaves away from the surface keep every sample on one side
    for leaf in (&node).leaves() {
        if !leaf.is_boundary() {
            let inside = leaf.values()[0] < 0.;
            assert!(leaf.values().iter().all(|v| (*v < 0.) == inside));
        }
    }
}

#[test]
fn test_sphere_sequential_and_parallel() {
    let counter = EvaluationCounter::new();
    let f = counted(sphere, &counter);

    let mut sequential = root();
    sequential
        .subdivide(&f, &SubdivisionOptions::default().with_max_depth(4))
        .unwrap();
    let evaluations = counter.count();
    assert_eq!(evaluations, (&sequential).count() * 125);

    counter.reset();
    let mut parallel = root();
    parallel
        .subdivide(
            &f,
            &SubdivisionOptions::default()
                .with_max_depth(4)
                .with_parallel(true),
        )
        .unwrap();
    assert_eq!(counter.count(), evaluations);
    assert_eq!((&sequential).count(), (&parallel).count());
    assert_eq!(
        sequential.boundary_leaves().len(),
        parallel.boundary_leaves().len()
    );
}

#[test]
fn test_sphere_weighted_split() {
    let mut node = SpaceTreeNode::<f64, U3, f64>::cube(
        Arc::new(Sampler::new(3).unwrap()),
        Arc::new(WeightedSplit::default()),
        Point3::new(-1., -1., -1.),
        2.,
    )
    .unwrap();
    assert!(node.divide(&sphere, 4).unwrap());

    // children tile their parent whatever the split point
    node.visit(|n| {
        if !n.children().is_empty() {
            assert_eq!(n.children().len(), 8);
            let volume: f64 = n.children().iter().map(|c| c.primitive().volume()).sum();
            assert!((volume - n.primitive().volume()).abs() < 1e-12);
        }
        true
    });

    for leaf in node.boundary_leaves() {
        let aabb = leaf.primitive().to_aabb();
        let closest = aabb.base().coords.zip_zip_map(
            &aabb.max().coords,
            &nalgebra::Vector3::zeros(),
            |lo, hi, o: f64| o.clamp(lo, hi),
        );
        // the surface passes through every boundary leaf
        assert!(closest.norm() <= 0.5 + 1e-12);
        let farthest = aabb
            .base()
            .coords
            .zip_map(&aabb.max().coords, |lo, hi| lo.abs().max(hi.abs()));
        assert!(farthest.norm() >= 0.5 - 1e-12);
    }
}
