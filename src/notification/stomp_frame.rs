//! A minimal STOMP 1.2 text-frame codec, just enough to `CONNECT`,
//! `SUBSCRIBE`, receive `MESSAGE`/`ERROR`/`RECEIPT` frames, and
//! `DISCONNECT` against the HMC's JMS broker. No general-purpose STOMP
//! crate exists in this crate's dependency set, so the wire format is
//! hand-rolled the same way the rest of this crate hand-rolls the HMC's
//! own JSON envelope.

use std::collections::HashMap;

/// One decoded STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StompFrame {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn header_map(&self) -> HashMap<String, String> {
        self.headers.iter().cloned().collect()
    }

    /// Encode to the wire representation, including the trailing NUL
    /// frame terminator.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(&self.command);
        out.push('\n');
        for (k, v) in &self.headers {
            out.push_str(&escape_header(k));
            out.push(':');
            out.push_str(&escape_header(v));
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        let mut bytes = out.into_bytes();
        bytes.push(0);
        bytes
    }

    /// Decode one frame from `raw`, which must not include the leading
    /// heartbeat newlines a STOMP server may interleave between frames
    /// (callers should strip those before calling this).
    pub fn decode(raw: &str) -> Option<Self> {
        let mut lines = raw.split('\n');
        let command = lines.next()?.to_string();
        if command.is_empty() {
            return None;
        }

        let mut headers = Vec::new();
        for line in &mut lines {
            if line.is_empty() {
                break;
            }
            let (k, v) = line.split_once(':')?;
            headers.push((unescape_header(k), unescape_header(v)));
        }

        let body: String = lines.collect::<Vec<_>>().join("\n");
        let body = body.trim_end_matches('\0').to_string();

        Some(Self {
            command,
            headers,
            body,
        })
    }
}

fn escape_header(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(':', "\\c")
}

fn unescape_header(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('c') => out.push(':'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Split a raw read buffer on STOMP's NUL frame terminator, returning
/// complete frames and leaving any trailing partial frame for the next
/// read.
pub fn split_frames(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut frames = Vec::new();
    loop {
        let Some(pos) = buffer.iter().position(|&b| b == 0) else {
            break;
        };
        let frame_bytes: Vec<u8> = buffer.drain(..=pos).collect();
        let text = String::from_utf8_lossy(&frame_bytes[..frame_bytes.len() - 1]).into_owned();
        let trimmed = text.trim_start_matches('\n');
        if !trimmed.is_empty() {
            frames.push(trimmed.to_string());
        }
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_connect_frame() {
        let frame = StompFrame::new("CONNECT")
            .with_header("login", "hmcuser")
            .with_header("passcode", "sid:abc123");
        let encoded = frame.encode();
        let text = String::from_utf8(encoded[..encoded.len() - 1].to_vec()).unwrap();
        let decoded = StompFrame::decode(&text).unwrap();
        assert_eq!(decoded.command, "CONNECT");
        assert_eq!(decoded.header("login"), Some("hmcuser"));
        assert_eq!(decoded.header("passcode"), Some("sid:abc123"));
    }

    #[test]
    fn decodes_message_frame_with_body() {
        let raw = "MESSAGE\ndestination:/topic/job-notification\nnotification-type:job-completion\n\n{\"job-uri\":\"/api/jobs/1\"}";
        let frame = StompFrame::decode(raw).unwrap();
        assert_eq!(frame.command, "MESSAGE");
        assert_eq!(frame.header("notification-type"), Some("job-completion"));
        assert_eq!(frame.body, "{\"job-uri\":\"/api/jobs/1\"}");
    }

    #[test]
    fn splits_multiple_frames_from_one_buffer() {
        let f1 = StompFrame::new("MESSAGE").with_body("a").encode();
        let f2 = StompFrame::new("MESSAGE").with_body("b").encode();
        let mut buf = f1;
        buf.extend(f2);
        let frames = split_frames(&mut buf);
        assert_eq!(frames.len(), 2);
        assert!(buf.is_empty());
    }

    #[test]
    fn escapes_colon_and_newline_in_headers() {
        let frame = StompFrame::new("MESSAGE").with_header("key", "a:b\nc");
        let encoded = frame.encode();
        let text = String::from_utf8(encoded[..encoded.len() - 1].to_vec()).unwrap();
        assert!(text.contains("key:a\\cb\\nc"));
    }
}
