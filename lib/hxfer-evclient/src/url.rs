/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

use url::Url;

use super::ClientError;

const DEFAULT_HTTP_PORT: u16 = 80;

/// Resolved request target: where to connect and what to ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    /// Path plus query, as sent on the request line.
    pub resource: String,
}

/// Parse and validate a plain-http URL. Validation failures happen before
/// any connection state is touched.
pub fn parse_url(raw: &str) -> Result<Target, ClientError> {
    let url = Url::parse(raw).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

    if url.scheme() != "http" {
        return Err(ClientError::UnsupportedScheme(url.scheme().to_string()));
    }
    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => return Err(ClientError::InvalidUrl("missing host".to_string())),
    };
    let port = url.port().unwrap_or(DEFAULT_HTTP_PORT);

    let mut resource = url.path().to_string();
    if resource.is_empty() {
        resource.push('/');
    }
    if let Some(query) = url.query() {
        resource.push('?');
        resource.push_str(query);
    }

    Ok(Target {
        host,
        port,
        resource,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_http_with_defaults() {
        let t = parse_url("http://example.net").unwrap();
        assert_eq!(t.host, "example.net");
        assert_eq!(t.port, 80);
        assert_eq!(t.resource, "/");
    }

    #[test]
    fn explicit_port_path_and_query() {
        let t = parse_url("http://example.net:8080/a/b?x=1&y=2").unwrap();
        assert_eq!(t.port, 8080);
        assert_eq!(t.resource, "/a/b?x=1&y=2");
    }

    #[test]
    fn non_http_schemes_are_rejected() {
        assert!(matches!(
            parse_url("https://example.net/"),
            Err(ClientError::UnsupportedScheme(s)) if s == "https"
        ));
        assert!(matches!(
            parse_url("ftp://host/x"),
            Err(ClientError::UnsupportedScheme(s)) if s == "ftp"
        ));
    }

    #[test]
    fn missing_host_is_invalid() {
        assert!(matches!(
            parse_url("http://"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            parse_url("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
