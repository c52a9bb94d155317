pub mod evaluation_counter;
pub mod space_tree_node;
pub mod subdivision_options;

pub use evaluation_counter::*;
pub use space_tree_node::*;
pub use subdivision_options::*;

#[cfg(test)]
mod tests;
