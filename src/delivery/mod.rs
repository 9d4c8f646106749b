pub mod bookmarklet;
pub mod install_page;
pub mod store;
