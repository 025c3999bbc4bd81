use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The result of executing a single HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResponseData {
    /// HTTP response status code (e.g. 200, 404).
    pub status: u16,

    /// Response headers in the order the server sent them. Names are kept as
    /// received; lookups go through [`ResponseData::header`].
    pub headers: Vec<(String, String)>,

    /// Response body after content-encoding (gzip, deflate, br) was removed.
    pub body: Vec<u8>,

    /// Round-trip time measured from just before `send()` to just after the
    /// body is fully received.
    pub elapsed: Duration,

    /// Approximate bytes received: status line, header lines and body.
    pub size_bytes: u64,
}

impl ResponseData {
    /// Case-insensitive header lookup; the first matching header wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Body decoded as UTF-8 with replacement characters for invalid sequences.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Approximate HTTP/1.1 bytes of a response head plus body.
pub(crate) fn response_wire_size(status: u16, headers: &[(String, String)], body_len: usize) -> u64 {
    let status_line = format!("HTTP/1.1 {status}\r\n").len();
    let header_lines: usize = headers
        .iter()
        .map(|(key, value)| key.len() + 2 + value.len() + 2)
        .sum();
    (status_line + header_lines + 2 + body_len) as u64
}
