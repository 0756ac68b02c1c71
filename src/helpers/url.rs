//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Characters escaped inside a query value
const QUERY_VALUE: &AsciiSet = &SEGMENT.add(b'&').add(b'=').add(b'+');

/// Route of a post detail page
///
/// # Examples
/// ```ignore
/// post_path("como-utilizar-hooks") // -> "/post/como-utilizar-hooks"
/// ```
pub fn post_path(uid: &str) -> String {
    format!("/post/{}", utf8_percent_encode(uid, SEGMENT))
}

/// Load-more endpoint for a CMS cursor, served by the dev server
pub fn load_more_url(cursor: &str) -> String {
    format!("/api/posts?cursor={}", utf8_percent_encode(cursor, QUERY_VALUE))
}

/// Load-more JSON file of the static export for a 1-based page number
pub fn static_page_url(page: usize) -> String {
    format!("/api/posts/{}.json", page)
}

/// Whether a slug can be used as a single directory name in the export
pub fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
}
