//! Response building.

/// Bytes written per send when streaming a response body.
pub const CHUNK_SIZE: usize = 1024;

/// Build a complete response with an exact `Content-Length`.
///
/// Headers are newline-separated and the connection is always closed.
pub fn respond(status: &str, content_type: &str, body: &str) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 {}\nContent-Type: {}\nContent-Length: {}\nConnection: close\n\n",
        status,
        content_type,
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body.as_bytes());
    out
}

/// A response the portal will send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: String,
    pub content_type: String,
    pub body: String,
}

impl HttpResponse {
    /// `200 OK` HTML page.
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: "200 OK".to_string(),
            content_type: "text/html".to_string(),
            body: body.into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        respond(&self.status, &self.content_type, &self.body)
    }
}
