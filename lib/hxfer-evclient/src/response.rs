/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

use atoi::FromRadix16;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use super::ClientError;

const MAX_HEADER_SIZE: usize = 65536;

/// One fully read response.
#[derive(Debug)]
pub struct HttpResponse {
    pub code: u16,
    /// Raw header lines, in arrival order, without line terminators.
    pub headers: Vec<String>,
    pub body: Bytes,
    /// Whether the connection may serve another exchange.
    pub keep_alive: bool,
}

impl HttpResponse {
    /// First value of a named header, case-insensitive.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}

fn trim_line(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && (line[end - 1] == b'\n' || line[end - 1] == b'\r') {
        end -= 1;
    }
    &line[..end]
}

async fn read_line<R>(
    reader: &mut R,
    line: &mut Vec<u8>,
    max: usize,
) -> Result<(), ClientError>
where
    R: AsyncBufRead + Unpin,
{
    let nr = reader.read_until(b'\n', line).await?;
    if nr == 0 {
        return Err(ClientError::MalformedResponse("truncated response"));
    }
    if line.len() > max {
        return Err(ClientError::TooLargeHeader);
    }
    Ok(())
}

fn parse_status_line(line: &[u8]) -> Result<(u16, bool), ClientError> {
    let line = trim_line(line);
    if !line.starts_with(b"HTTP/1.") || line.len() < 12 {
        return Err(ClientError::MalformedResponse("bad status line"));
    }
    // HTTP/1.1 defaults to keep-alive, HTTP/1.0 to close
    let keep_alive = line[7] == b'1';

    let sp = memchr::memchr(b' ', line)
        .ok_or(ClientError::MalformedResponse("bad status line"))?;
    let rest = &line[sp + 1..];
    let end = memchr::memchr(b' ', rest).unwrap_or(rest.len());
    let code: u16 = atoi::atoi(&rest[..end])
        .ok_or(ClientError::MalformedResponse("bad status code"))?;
    if !(100..=599).contains(&code) {
        return Err(ClientError::MalformedResponse("bad status code"));
    }
    Ok((code, keep_alive))
}

async fn read_chunked<R>(reader: &mut R, body: &mut BytesMut) -> Result<(), ClientError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::with_capacity(32);
    loop {
        line.clear();
        read_line(reader, &mut line, 1024).await?;
        let head = trim_line(&line);
        let head = match memchr::memchr(b';', head) {
            Some(p) => &head[..p],
            None => head,
        };
        let (size, digits) = u64::from_radix_16(head);
        if digits == 0 {
            return Err(ClientError::MalformedResponse("bad chunk size"));
        }

        if size == 0 {
            // trailer section, up to the final empty line
            loop {
                line.clear();
                read_line(reader, &mut line, MAX_HEADER_SIZE).await?;
                if trim_line(&line).is_empty() {
                    return Ok(());
                }
            }
        }

        let mut chunk = vec![0u8; size as usize];
        reader.read_exact(&mut chunk).await?;
        body.extend_from_slice(&chunk);

        line.clear();
        read_line(reader, &mut line, 16).await?;
        if !trim_line(&line).is_empty() {
            return Err(ClientError::MalformedResponse("missing chunk delimiter"));
        }
    }
}

/// Read one response off the stream: status line, ordered header lines,
/// then the body by content-length, chunked decoding, or read-to-end.
/// Informational 1xx messages are skipped until the final response.
pub(crate) async fn read_response<R>(reader: &mut R) -> Result<HttpResponse, ClientError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::with_capacity(256);
    let mut header_size = 0usize;

    let (code, mut keep_alive, headers, content_length, chunked) = loop {
        line.clear();
        read_line(reader, &mut line, MAX_HEADER_SIZE).await?;
        let (code, mut keep_alive) = parse_status_line(&line)?;
        header_size += line.len();

        let mut headers = Vec::new();
        let mut content_length: Option<u64> = None;
        let mut chunked = false;
        loop {
            line.clear();
            read_line(reader, &mut line, MAX_HEADER_SIZE).await?;
            header_size += line.len();
            if header_size > MAX_HEADER_SIZE {
                return Err(ClientError::TooLargeHeader);
            }
            let trimmed = trim_line(&line);
            if trimmed.is_empty() {
                break;
            }
            let text = String::from_utf8_lossy(trimmed).into_owned();
            if let Some((name, value)) = text.split_once(':') {
                let value = value.trim();
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = atoi::atoi(value.as_bytes());
                } else if name.eq_ignore_ascii_case("transfer-encoding") {
                    chunked = value
                        .split(',')
                        .any(|t| t.trim().eq_ignore_ascii_case("chunked"));
                } else if name.eq_ignore_ascii_case("connection") {
                    if value.eq_ignore_ascii_case("close") {
                        keep_alive = false;
                    } else if value.eq_ignore_ascii_case("keep-alive") {
                        keep_alive = true;
                    }
                }
            }
            headers.push(text);
        }

        if (100..200).contains(&code) {
            continue;
        }
        break (code, keep_alive, headers, content_length, chunked);
    };

    let mut body = BytesMut::new();
    if code == 204 || code == 304 {
        // no body by definition
    } else if chunked {
        read_chunked(reader, &mut body).await?;
    } else if let Some(len) = content_length {
        body.resize(len as usize, 0);
        reader.read_exact(&mut body).await?;
    } else {
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await?;
        body.extend_from_slice(&rest);
        // end of body is end of stream, nothing left to reuse
        keep_alive = false;
    }

    Ok(HttpResponse {
        code,
        headers,
        body: body.freeze(),
        keep_alive,
    })
}
