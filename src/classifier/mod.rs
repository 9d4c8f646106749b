pub mod classifier;
pub mod heuristic;
pub mod inference;
pub mod prompt;
pub mod response;
