pub mod plan;
pub mod program;
