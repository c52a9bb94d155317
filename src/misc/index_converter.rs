use crate::error::SpaceTreeError;

/// Converts between linear indices and per-axis grid coordinates.
///
/// Axis 0 is the least significant digit, so for `base = 2` bit `j` of an index
/// selects the lower (0) or upper (1) half along axis `j`.
/// The same ordering is used for sample points and for split children.
/// # Example
/// ```
/// use spacetree::prelude::IndexConverter;
/// let converter = IndexConverter::new(3, 2).unwrap();
/// assert_eq!(converter.size(), 9);
/// assert!(IndexConverter::new(1 << 22, 3).is_err());
/// assert_eq!(converter.coordinates(5).unwrap(), vec![2, 1]);
/// assert_eq!(converter.index(&[2, 1]).unwrap(), 5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexConverter {
    base: usize,
    dim: usize,
    size: usize,
}

impl IndexConverter {
    /// Fails when `base^dim` does not fit in a `usize`.
    pub fn new(base: usize, dim: usize) -> anyhow::Result<Self> {
        let size = u32::try_from(dim)
            .ok()
            .and_then(|exp| base.checked_pow(exp))
            .ok_or_else(|| {
                SpaceTreeError::Geometry(format!(
                    "{} points along each of {} axes overflow the index range",
                    base, dim
                ))
            })?;
        Ok(Self { base, dim, size })
    }

    /// Split children of a `dim` dimensional cell
    pub(crate) fn binary(dim: usize) -> Self {
        Self {
            base: 2,
            dim,
            size: 1 << dim,
        }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of distinct indices (`base^dim`)
    pub fn size(&self) -> usize {
        self.size
    }

    /// Decode an index into per-axis coordinates
    pub fn coordinates(&self, index: usize) -> anyhow::Result<Vec<usize>> {
        let size = self.size();
        if index >= size {
            return Err(SpaceTreeError::OutOfRange { index, size }.into());
        }
        Ok(self.digits(index).collect())
    }

    /// Encode per-axis coordinates into an index
    pub fn index(&self, coordinates: &[usize]) -> anyhow::Result<usize> {
        if coordinates.len() != self.dim {
            return Err(SpaceTreeError::Geometry(format!(
                "expected {} coordinates, got {}",
                self.dim,
                coordinates.len()
            ))
            .into());
        }
        coordinates.iter().rev().try_fold(0, |acc, &c| {
            if c >= self.base {
                Err(SpaceTreeError::OutOfRange {
                    index: c,
                    size: self.base,
                }
                .into())
            } else {
                Ok(acc * self.base + c)
            }
        })
    }

    /// Per-axis digits of an index without range checking.
    /// Digits beyond `size()` wrap into the highest axis.
    pub(crate) fn digits(&self, index: usize) -> impl Iterator<Item = usize> {
        let base = self.base.max(1);
        (0..self.dim).scan(index, move |rest, _| {
            let digit = *rest % base;
            *rest /= base;
            Some(digit)
        })
    }

    /// Stride between neighbouring indices along `axis`, which must be below `dim`
    pub(crate) fn stride(&self, axis: usize) -> usize {
        self.base.pow(axis as u32)
    }
}
