//! Storefront wire protocol: REST routes, chat destinations and the STOMP
//! frame codec used by the chat broker.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

// --- REST routes ---

pub const PRODUCTS_PATH: &str = "/api/products";
pub const PRODUCTS_BY_CATEGORY_PATH: &str = "/api/products/category";
pub const UPLOAD_PATH: &str = "/api/products/upload";
pub const LOGIN_PATH: &str = "/login";

/// Multipart field carrying the image bytes on upload.
pub const UPLOAD_FIELD: &str = "image";

/// GET requests whose path starts with one of these never carry a bearer token.
pub const PUBLIC_GET_PREFIXES: [&str; 3] = [
    "/api/products",
    "/api/products/category/",
    "/api/products/uploads/",
];

// --- Chat ---

pub const CHAT_ENDPOINT: &str = "/chat";
pub const CHAT_TOPIC: &str = "/topic/messages";
pub const CHAT_SEND_DESTINATION: &str = "/app/chat.send";
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;

pub const STOMP_VERSION: &str = "1.2";

// --- STOMP frames ---

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,
    #[error("unknown STOMP command: {0}")]
    UnknownCommand(String),
    #[error("malformed header line: {0}")]
    MalformedHeader(String),
    #[error("invalid escape sequence in header: {0}")]
    InvalidEscape(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StompCommand {
    Connect,
    Connected,
    Send,
    Subscribe,
    Unsubscribe,
    Disconnect,
    Message,
    Receipt,
    Error,
}

impl StompCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            StompCommand::Connect => "CONNECT",
            StompCommand::Connected => "CONNECTED",
            StompCommand::Send => "SEND",
            StompCommand::Subscribe => "SUBSCRIBE",
            StompCommand::Unsubscribe => "UNSUBSCRIBE",
            StompCommand::Disconnect => "DISCONNECT",
            StompCommand::Message => "MESSAGE",
            StompCommand::Receipt => "RECEIPT",
            StompCommand::Error => "ERROR",
        }
    }

    /// CONNECT and CONNECTED headers are sent without escaping.
    fn escapes_headers(&self) -> bool {
        !matches!(self, StompCommand::Connect | StompCommand::Connected)
    }
}

impl fmt::Display for StompCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StompCommand {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "CONNECT" | "STOMP" => StompCommand::Connect,
            "CONNECTED" => StompCommand::Connected,
            "SEND" => StompCommand::Send,
            "SUBSCRIBE" => StompCommand::Subscribe,
            "UNSUBSCRIBE" => StompCommand::Unsubscribe,
            "DISCONNECT" => StompCommand::Disconnect,
            "MESSAGE" => StompCommand::Message,
            "RECEIPT" => StompCommand::Receipt,
            "ERROR" => StompCommand::Error,
            other => return Err(FrameError::UnknownCommand(other.to_string())),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: StompCommand,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StompFrame {
    pub fn new(command: StompCommand) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value for `key`; repeated headers keep the first occurrence.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn connect(host: &str) -> Self {
        Self::new(StompCommand::Connect)
            .header("accept-version", STOMP_VERSION)
            .header("host", host)
            .header("heart-beat", "0,0")
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new(StompCommand::Subscribe)
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn send_json(destination: &str, json: String) -> Self {
        Self::new(StompCommand::Send)
            .header("destination", destination)
            .header("content-type", "application/json")
            .header("content-length", json.len().to_string())
            .with_body(json)
    }

    pub fn disconnect() -> Self {
        Self::new(StompCommand::Disconnect)
    }

    /// Serialize to wire text, including the trailing NUL.
    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(32 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');
        for (k, v) in &self.headers {
            if escape {
                out.push_str(&escape_header(k));
                out.push(':');
                out.push_str(&escape_header(v));
            } else {
                out.push_str(k);
                out.push(':');
                out.push_str(v);
            }
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse a single frame. `Ok(None)` means the text was only heart-beat EOLs.
    pub fn parse(text: &str) -> Result<Option<Self>, FrameError> {
        let text = text.trim_start_matches(['\r', '\n']);
        let text = text.strip_suffix('\0').unwrap_or(text);
        if text.is_empty() {
            return Ok(None);
        }

        let (head, body) = match text.find("\n\n") {
            Some(idx) => (&text[..idx], &text[idx + 2..]),
            None => match text.find("\r\n\r\n") {
                Some(idx) => (&text[..idx], &text[idx + 4..]),
                None => (text, ""),
            },
        };

        let mut lines = head.split('\n').map(|l| l.trim_end_matches('\r'));
        let command: StompCommand = lines.next().ok_or(FrameError::Empty)?.parse()?;
        let escape = command.escapes_headers();

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let (k, v) = line
                .split_once(':')
                .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;
            if escape {
                headers.push((unescape_header(k)?, unescape_header(v)?));
            } else {
                headers.push((k.to_string(), v.to_string()));
            }
        }

        let mut frame = StompFrame {
            command,
            headers,
            body: body.to_string(),
        };

        if let Some(len) = frame.get("content-length").and_then(|v| v.parse::<usize>().ok()) {
            if len < frame.body.len() && frame.body.is_char_boundary(len) {
                frame.body.truncate(len);
            }
        }

        Ok(Some(frame))
    }

    /// Parse every NUL-terminated frame in one transport message.
    pub fn parse_all(text: &str) -> Result<Vec<Self>, FrameError> {
        let mut frames = Vec::new();
        for chunk in text.split('\0') {
            if let Some(frame) = Self::parse(chunk)? {
                frames.push(frame);
            }
        }
        Ok(frames)
    }
}

fn escape_header(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(s: &str) -> Result<String, FrameError> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            _ => return Err(FrameError::InvalidEscape(s.to_string())),
        }
    }
    Ok(out)
}
