//! Query predicates in the Prismic `q` syntax

use std::fmt;

/// A single query predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `path` equals `value`, e.g. `at(document.type, "posts")`
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Render a predicate list as a `q` parameter: `[[at(...)][at(...)]]`
    pub fn to_query(predicates: &[Predicate]) -> String {
        let inner: String = predicates.iter().map(|p| format!("[{}]", p)).collect();
        format!("[{}]", inner)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::At { path, value } => {
                let value = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "at({}, \"{}\")", path, value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_query() {
        let predicates = [Predicate::at("document.type", "posts")];
        assert_eq!(
            Predicate::to_query(&predicates),
            r#"[[at(document.type, "posts")]]"#
        );

        let predicates = [
            Predicate::at("document.type", "posts"),
            Predicate::at("my.posts.uid", "hello"),
        ];
        assert_eq!(
            Predicate::to_query(&predicates),
            r#"[[at(document.type, "posts")][at(my.posts.uid, "hello")]]"#
        );
    }

    #[test]
    fn test_values_are_quoted() {
        let p = Predicate::at("my.posts.uid", r#"say "hi""#);
        assert_eq!(p.to_string(), r#"at(my.posts.uid, "say \"hi\"")"#);
    }
}
