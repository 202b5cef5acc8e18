/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

use http::Method;

use super::url::Target;

fn has_header(headers: &[String], name: &str) -> bool {
    headers.iter().any(|line| {
        line.split_once(':')
            .is_some_and(|(n, _)| n.trim().eq_ignore_ascii_case(name))
    })
}

/// Serialize one HTTP/1.1 request head plus body.
///
/// Caller header lines go out verbatim, in their given order. A Host header
/// is synthesized unless the caller supplied one; the same applies to
/// Content-Length when a body is present.
pub(crate) fn serialize_request(
    method: &Method,
    target: &Target,
    headers: &[String],
    body: &[u8],
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256 + body.len());
    buf.extend_from_slice(method.as_str().as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(target.resource.as_bytes());
    buf.extend_from_slice(b" HTTP/1.1\r\n");

    if !has_header(headers, "host") {
        buf.extend_from_slice(b"Host: ");
        buf.extend_from_slice(target.host.as_bytes());
        if target.port != 80 {
            let mut port = itoa::Buffer::new();
            buf.push(b':');
            buf.extend_from_slice(port.format(target.port).as_bytes());
        }
        buf.extend_from_slice(b"\r\n");
    }

    for line in headers {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }
        buf.extend_from_slice(line.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    if (!body.is_empty() || *method == Method::POST) && !has_header(headers, "content-length") {
        let mut len = itoa::Buffer::new();
        buf.extend_from_slice(b"Content-Length: ");
        buf.extend_from_slice(len.format(body.len()).as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    buf.extend_from_slice(b"\r\n");
    buf.extend_from_slice(body);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(port: u16) -> Target {
        Target {
            host: "example.net".to_string(),
            port,
            resource: "/p?q=1".to_string(),
        }
    }

    #[test]
    fn get_without_body() {
        let out = serialize_request(&Method::GET, &target(80), &[], b"");
        assert_eq!(
            out,
            b"GET /p?q=1 HTTP/1.1\r\nHost: example.net\r\n\r\n"
        );
    }

    #[test]
    fn non_default_port_in_host() {
        let out = serialize_request(&Method::GET, &target(8080), &[], b"");
        assert!(out.starts_with(b"GET /p?q=1 HTTP/1.1\r\nHost: example.net:8080\r\n"));
    }

    #[test]
    fn post_gets_content_length() {
        let out = serialize_request(&Method::POST, &target(80), &[], b"k=v");
        let text = std::str::from_utf8(&out).unwrap();
        assert!(text.contains("Content-Length: 3\r\n"));
        assert!(text.ends_with("\r\n\r\nk=v"));
    }

    #[test]
    fn caller_headers_kept_in_order_and_not_duplicated() {
        let headers = vec![
            "Host: override.example".to_string(),
            "X-A: 1".to_string(),
            "X-B: 2\r\n".to_string(),
        ];
        let out = serialize_request(&Method::GET, &target(80), &headers, b"");
        let text = std::str::from_utf8(&out).unwrap();
        assert!(!text.contains("Host: example.net"));
        let a = text.find("X-A: 1").unwrap();
        let b = text.find("X-B: 2").unwrap();
        assert!(text.find("Host: override.example").unwrap() < a);
        assert!(a < b);
    }

    #[test]
    fn empty_post_still_has_zero_length() {
        let out = serialize_request(&Method::POST, &target(80), &[], b"");
        let text = std::str::from_utf8(&out).unwrap();
        assert!(text.contains("Content-Length: 0\r\n"));
    }
}
