pub mod field_value;
pub mod floating_point;
pub mod index_converter;

pub use field_value::*;
pub use floating_point::*;
pub use index_converter::*;
