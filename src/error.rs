/// Errors raised by the space partitioning trees.
///
/// Public APIs return `anyhow::Result`, use `downcast_ref::<SpaceTreeError>()` to inspect the kind.
#[derive(Debug, thiserror::Error)]
pub enum SpaceTreeError {
    /// A geometric contract was violated (e.g. splitting a box at a point outside of it)
    #[error("Geometry error: {0}")]
    Geometry(String),
    /// Index beyond the number of available elements
    #[error("Index {index} is out of range for size {size}")]
    OutOfRange { index: usize, size: usize },
    /// The referenced object has been dropped by its owner
    #[error("Object has expired")]
    ExpiredObject,
    /// Box file header with a zero or unsupported field
    #[error("Invalid box file header: dimension {dimension}, coordinate bytes {coordinate_bytes}")]
    InvalidHeader {
        dimension: u64,
        coordinate_bytes: u64,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
