pub mod classifier;
pub mod cli;
pub mod delivery;
pub mod error;
pub mod form;
pub mod page;
pub mod synth;
pub mod trace;
