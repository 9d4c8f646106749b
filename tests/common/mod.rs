pub mod http_stub;
pub mod js_page;
pub mod utils;
