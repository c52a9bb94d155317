use std::io::Write;

use itertools::Itertools;
use nalgebra::{allocator::Allocator, DefaultAllocator, DimName};

use crate::{
    error::SpaceTreeError,
    misc::{FieldValue, FloatingPoint},
    space_tree::SpaceTreeNode,
    tree::Tree,
};

/// Write the center and first cached value of every evaluated leaf as CSV.
///
/// The header names the coordinates `x0, x1, ...` followed by `value`.
/// Returns the number of rows written.
pub fn write_csv<T, D, V, W>(node: &SpaceTreeNode<T, D, V>, mut writer: W) -> anyhow::Result<usize>
where
    T: FloatingPoint,
    D: DimName,
    V: FieldValue,
    W: Write,
    DefaultAllocator: Allocator<D>,
{
    let header = (0..D::dim())
        .map(|axis| format!("x{}", axis))
        .chain(std::iter::once("value".to_string()))
        .join(",");
    writeln!(writer, "{}", header).map_err(SpaceTreeError::from)?;

    let mut rows = 0;
    for leaf in node.leaves() {
        let Some(value) = leaf.values().first() else {
            continue;
        };
        let row = leaf
            .center()
            .iter()
            .map(|c| c.to_f64_lossy())
            .chain(std::iter::once(value.as_f64()))
            .join(",");
        writeln!(writer, "{}", row).map_err(SpaceTreeError::from)?;
        rows += 1;
    }
    writer.flush().map_err(SpaceTreeError::from)?;
    Ok(rows)
}
