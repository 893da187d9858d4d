//! Incremental decoding of `text/event-stream` bodies.

/// One server-sent event: its `event:` name and its `data:` lines joined by
/// newlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Splits a byte stream into frames. Chunks may end anywhere, including in
/// the middle of a UTF-8 sequence; only complete frames are decoded.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some((end, separator)) = frame_boundary(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + separator).collect();
            if let Some(frame) = parse_block(&String::from_utf8_lossy(&block[..end])) {
                frames.push(frame);
            }
        }
        frames
    }

    /// The last frame when the body ended without a blank line.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.buffer);
        parse_block(&String::from_utf8_lossy(&rest))
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Start of the earliest blank line, and its length.
fn frame_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buffer, b"\n\n").map(|at| (at, 2));
    let crlf = find(buffer, b"\r\n\r\n").map(|at| (at, 4));
    match (lf, crlf) {
        (Some(lf), Some(crlf)) => Some(if lf.0 <= crlf.0 { lf } else { crlf }),
        (lf, crlf) => lf.or(crlf),
    }
}

fn parse_block(block: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event = Some(value.to_string()),
            "data" => data.push(value),
            _ => {}
        }
    }

    if event.is_none() && data.is_empty() {
        return None;
    }
    Some(SseFrame {
        event: event.unwrap_or_else(|| "message".to_string()),
        data: data.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(event: &str, data: &str) -> SseFrame {
        SseFrame {
            event: event.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_complete_frames() {
        let mut decoder = SseDecoder::new();

        let frames = decoder.push(b"event: ping\ndata: {}\n\nevent: message_stop\ndata: {\"a\":1}\n\n");

        assert_eq!(
            frames,
            vec![frame("ping", "{}"), frame("message_stop", "{\"a\":1}")]
        );
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(b"event: content_block_delta\nda").is_empty());
        assert!(decoder.push(b"ta: {\"x\":true}\n").is_empty());
        let frames = decoder.push(b"\nevent: ping\n");

        assert_eq!(frames, vec![frame("content_block_delta", "{\"x\":true}")]);
        assert_eq!(decoder.finish(), Some(frame("ping", "")));
    }

    #[test]
    fn test_crlf_and_comments() {
        let mut decoder = SseDecoder::new();

        let frames = decoder.push(b": keepalive\r\n\r\nevent: ping\r\ndata: {}\r\n\r\n");

        assert_eq!(frames, vec![frame("ping", "{}")]);
    }

    #[test]
    fn test_utf8_split_inside_character() {
        let mut decoder = SseDecoder::new();
        let body = "data: héllo\n\n".as_bytes();
        let split = body.iter().position(|&b| b >= 0x80).unwrap() + 1;

        assert!(decoder.push(&body[..split]).is_empty());
        let frames = decoder.push(&body[split..]);

        assert_eq!(frames, vec![frame("message", "héllo")]);
    }

    #[test]
    fn test_multiline_data_is_joined() {
        let mut decoder = SseDecoder::new();

        let frames = decoder.push(b"data: one\ndata: two\n\n");

        assert_eq!(frames, vec![frame("message", "one\ntwo")]);
    }
}
