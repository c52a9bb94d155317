use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint};

use crate::{misc::FloatingPoint, tree::Tree};

use super::Primitive;

/// A primitive that can be subdivided into `2^D` owned children.
///
/// A cell is either a leaf or fully split, partial splits are never produced.
#[derive(Clone, Debug)]
pub struct Cell<T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    primitive: Primitive<T, D>,
    children: Vec<Cell<T, D>>,
}

impl<T: FloatingPoint, D: DimName> Cell<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    pub fn new(primitive: Primitive<T, D>) -> Self {
        Self {
            primitive,
            children: vec![],
        }
    }

    pub fn primitive(&self) -> &Primitive<T, D> {
        &self.primitive
    }

    pub fn children(&self) -> &[Self] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Self] {
        &mut self.children
    }

    /// Split the cell at `point`, replacing any existing children.
    pub fn split(&mut self, point: &OPoint<T, D>) -> anyhow::Result<()> {
        let children = self.primitive.split(point)?;
        if !self.children.is_empty() {
            log::warn!(
                "re-splitting a cell discards its {} existing children",
                self.children.len()
            );
        }
        self.children = children.into_iter().map(Self::new).collect();
        Ok(())
    }
}

impl<'a, T: FloatingPoint, D: DimName> Tree for &'a Cell<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    fn children(self) -> impl Iterator<Item = Self> {
        self.children.iter()
    }
}
