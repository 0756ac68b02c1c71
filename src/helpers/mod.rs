//! Helper functions shared by fetchers, templates and the server

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
