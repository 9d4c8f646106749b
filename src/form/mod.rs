pub mod extract;
pub mod form_model;
pub mod patterns;
