pub mod fs;
pub mod python;
