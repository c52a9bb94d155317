pub mod box_file;
pub mod csv;

pub use box_file::*;
pub use csv::*;
