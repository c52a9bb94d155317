#![allow(clippy::needless_range_loop)]

mod bounding_box;
mod error;
mod export;
mod misc;
mod primitive;
mod sampler;
mod space_tree;
mod split_policy;
mod tree;

pub mod prelude {
    pub use crate::bounding_box::*;
    pub use crate::error::*;
    pub use crate::export::*;
    pub use crate::misc::*;
    pub use crate::primitive::*;
    pub use crate::sampler::*;
    pub use crate::space_tree::*;
    pub use crate::split_policy::*;
    pub use crate::tree::*;
}
