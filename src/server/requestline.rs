//! Request-line preservation.
//!
//! A prior Python/WSGI deployment of this proxy subclassed gevent's
//! `WSGIHandler` to inject the literal request-line path into the WSGI
//! environ, because Werkzeug's own `request.path`/`request.url`
//! reconstruction drops a trailing `?` with an empty query string.
//! `http::Uri`, which `axum` and `hyper` build requests on, does not have
//! that problem: a request line of `GET /foo? HTTP/1.1` parses to a `Uri`
//! whose `path_and_query()` retains `query = Some("")`, and
//! `PathAndQuery`'s `Display` impl writes the `?` back out even for an
//! empty query. So there is no need for a low-level connection hook here —
//! but this guarantee is explicitly tested, not an incidental detail, so it
//! gets its own named, unit-tested function rather than being inlined
//! where it's used.

use axum::http::Uri;

/// Returns the original request target (path plus, verbatim, a `?` and
/// query string if the client sent one — including a bare trailing `?`),
/// exactly as it appeared on the wire.
pub fn original_request_target(uri: &Uri) -> String {
    match uri.path_and_query() {
        Some(pq) => pq.as_str().to_string(),
        None => uri.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_bare_trailing_question_mark() {
        let uri: Uri = "/some/object?".parse().unwrap();
        assert_eq!(original_request_target(&uri), "/some/object?");
    }

    #[test]
    fn preserves_query_string() {
        let uri: Uri = "/some/object?a=b".parse().unwrap();
        assert_eq!(original_request_target(&uri), "/some/object?a=b");
    }

    #[test]
    fn plain_path_has_no_question_mark() {
        let uri: Uri = "/some/object".parse().unwrap();
        assert_eq!(original_request_target(&uri), "/some/object");
    }
}
