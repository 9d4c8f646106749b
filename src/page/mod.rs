pub mod accessor;
pub mod filler;
pub mod memory;
