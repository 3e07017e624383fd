//! Request parsing.
//!
//! Parses the buffer read from a portal client. A truncated request, or one
//! without a blank line before the body, still parses; it just has no form
//! parameters. [`is_complete`] tells the reader when to stop waiting.

use std::collections::HashMap;

use thiserror::Error;

use crate::codec::parse_pairs;

/// Errors that can occur while parsing a request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The buffer held no request line at all.
    #[error("Empty request")]
    Empty,
}

/// Request method, as far as the portal cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other,
}

/// A parsed portal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query_params: HashMap<String, String>,
    pub form_params: HashMap<String, String>,
}

impl HttpRequest {
    /// Parse a raw request buffer.
    ///
    /// - Any request line containing `POST` is a POST; a line starting with
    ///   `GET` is a GET; anything else is `Other`.
    /// - The query string is everything between the first `?` and the next
    ///   space of the request line.
    /// - The body starts after the first `\r\n\r\n`, or the first `\n\n` if
    ///   there is no CRLF separator.
    pub fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        let text = String::from_utf8_lossy(raw);
        let start_line = text.lines().next().unwrap_or("").trim();
        if start_line.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut tokens = start_line.split_whitespace();
        let method_token = tokens.next().unwrap_or("");
        let method = if start_line.contains("POST") {
            Method::Post
        } else if method_token == "GET" {
            Method::Get
        } else {
            Method::Other
        };

        let target = tokens.next().unwrap_or("");
        let path = target.split('?').next().unwrap_or("").to_string();

        let query_params = start_line
            .split_once('?')
            .map(|(_, rest)| rest.split(' ').next().unwrap_or(""))
            .map(parse_pairs)
            .unwrap_or_default();

        let form_params = body(&text).map(parse_pairs).unwrap_or_default();

        Ok(Self {
            method,
            path,
            query_params,
            form_params,
        })
    }

    /// Query parameter, if present.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query_params.get(key).map(String::as_str)
    }

    /// Form parameter, or empty if absent.
    pub fn form(&self, key: &str) -> &str {
        self.form_params.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::Post
    }
}

/// The part of a request after the header/body separator.
pub fn body(text: &str) -> Option<&str> {
    text.split_once("\r\n\r\n")
        .or_else(|| text.split_once("\n\n"))
        .map(|(_, body)| body.trim_end_matches(['\r', '\n', '\0']))
}

/// Whether `raw` holds the full header block and as many body bytes as
/// `Content-Length` announces. A missing or unreadable length means no body.
pub fn is_complete(raw: &[u8]) -> bool {
    let Some((head_len, separator)) = find_separator(raw) else {
        return false;
    };
    let head = String::from_utf8_lossy(&raw[..head_len]);
    raw.len() - head_len - separator >= content_length(&head)
}

fn find_separator(raw: &[u8]) -> Option<(usize, usize)> {
    raw.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, 4))
        .or_else(|| raw.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2)))
}

fn content_length(head: &str) -> usize {
    head.lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
