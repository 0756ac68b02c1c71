//! Content module - display models, rich text, fetchers and reading time

mod error;
mod fetch;
mod post;
pub mod reading_time;
pub mod richtext;

pub use error::FetchError;
pub use fetch::PostFetcher;
pub use post::{ContentBlock, PostDetail, PostSummary, PostsPage};
pub use reading_time::{count_words, reading_time, DEFAULT_WORDS_PER_MINUTE};
pub use richtext::{as_html, as_text, RichTextBlock};
