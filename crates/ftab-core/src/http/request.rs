use serde::{Deserialize, Serialize};

/// A case after placeholder substitution, ready to go on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PreparedRequest {
    pub method: String,
    pub url: String,
    /// Headers in file order.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: String,
}

impl PreparedRequest {
    /// Case-insensitive header lookup; the first matching header wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Approximate HTTP/1.1 bytes for this request: request line, header
    /// lines, blank line and body.
    pub fn wire_size(&self) -> u64 {
        let request_line = self.method.len() + 1 + self.url.len() + " HTTP/1.1\r\n".len();
        let header_lines: usize = self
            .headers
            .iter()
            .map(|(key, value)| key.len() + 2 + value.len() + 2)
            .sum();
        (request_line + header_lines + 2 + self.body.len()) as u64
    }
}
