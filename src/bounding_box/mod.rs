pub mod aabb_tree;
pub mod aabbox;
pub mod boundable;
pub mod partition_options;

pub use aabb_tree::*;
pub use aabbox::*;
pub use boundable::*;
pub use partition_options::*;
