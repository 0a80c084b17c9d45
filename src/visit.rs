//! Visit events: the sanitized request metadata reported to the analytics
//! endpoint.

use std::collections::BTreeMap;

use axum::http::{header, HeaderMap, Method, Uri};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

/// One inbound request as seen by the analytics API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitEvent {
    pub request_path: String,
    pub request_method: String,
    /// Canonical header name to every value sent for it. Never contains
    /// `Cookie`.
    pub request_headers: BTreeMap<String, Vec<String>>,
}

impl VisitEvent {
    pub fn new(uri: &Uri, method: &Method, headers: &HeaderMap) -> Self {
        Self {
            request_path: decoded_path(uri),
            request_method: method.as_str().to_string(),
            request_headers: sanitize_headers(headers),
        }
    }
}

/// The URI path with percent-escapes decoded. Invalid UTF-8 after decoding
/// is replaced lossily.
pub fn decoded_path(uri: &Uri) -> String {
    percent_decode_str(uri.path()).decode_utf8_lossy().into_owned()
}

/// Copy `headers` into a multi-map keyed by canonical name, dropping the
/// cookie header. Non UTF-8 values are converted lossily.
pub fn sanitize_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        if name == header::COOKIE {
            continue;
        }
        out.entry(canonical_header_name(name.as_str()))
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    out
}

/// `x-forwarded-for` -> `X-Forwarded-For`.
pub fn canonical_header_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn canonicalizes_names() {
        assert_eq!(canonical_header_name("user-agent"), "User-Agent");
        assert_eq!(canonical_header_name("x-forwarded-for"), "X-Forwarded-For");
        assert_eq!(canonical_header_name("dnt"), "Dnt");
    }

    #[test]
    fn strips_cookie_and_keeps_repeated_values() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("GPTBot/1.0"));
        headers.insert(header::COOKIE, HeaderValue::from_static("session=abc"));
        headers.append(header::ACCEPT, HeaderValue::from_static("text/html"));
        headers.append(header::ACCEPT, HeaderValue::from_static("*/*"));

        let event = VisitEvent::new(
            &Uri::from_static("https://example.com/blog/post?id=7"),
            &Method::GET,
            &headers,
        );

        assert_eq!(event.request_path, "/blog/post");
        assert_eq!(event.request_method, "GET");
        assert!(!event.request_headers.contains_key("Cookie"));
        assert_eq!(event.request_headers["User-Agent"], vec!["GPTBot/1.0"]);
        assert_eq!(event.request_headers["Accept"], vec!["text/html", "*/*"]);
    }

    #[test]
    fn path_is_percent_decoded_without_query() {
        let event = VisitEvent::new(
            &Uri::from_static("/caf%C3%A9/a%20b?x=1"),
            &Method::GET,
            &HeaderMap::new(),
        );
        assert_eq!(event.request_path, "/café/a b");

        let plain = VisitEvent::new(&Uri::from_static("/docs/intro"), &Method::GET, &HeaderMap::new());
        assert_eq!(plain.request_path, "/docs/intro");
    }

    #[test]
    fn host_header_is_reported() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("example.com"));
        let event = VisitEvent::new(&Uri::from_static("/"), &Method::GET, &headers);
        assert_eq!(event.request_headers["Host"], vec!["example.com"]);
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8"));
        let event = VisitEvent::new(&Uri::from_static("/"), &Method::POST, &headers);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "request_path": "/",
                "request_method": "POST",
                "request_headers": {"User-Agent": ["curl/8"]}
            })
        );
    }
}
