//! Incremental SSE record decoding.
//!
//! The completion endpoint streams line-oriented `data: `-prefixed records
//! terminated by a `[DONE]` sentinel. That framing is a protocol detail of
//! the gateway; it is decoded here, behind the gateway, and never reaches
//! the assembler.
//!
//! The decoder buffers raw bytes and only decodes complete lines, so a
//! multi-byte UTF-8 character torn across two network chunks is reassembled
//! instead of mangled.

/// One decoded record from the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// Payload of one `data: ` record.
    Data(String),
    /// The `[DONE]` sentinel — the stream is complete.
    Done,
}

/// Stateful line decoder over an SSE byte stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every record completed by this chunk.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            let line = line.trim_end_matches(['\n', '\r']).trim_start();

            // Blank lines separate events; `:` lines are comments; `event:`
            // lines carry no payload we care about.
            let Some(data) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:"))
            else {
                continue;
            };

            let data = data.trim();
            if data.is_empty() {
                continue;
            }
            if data == "[DONE]" {
                events.push(SseEvent::Done);
            } else {
                events.push(SseEvent::Data(data.to_string()));
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_data_records() {
        let mut dec = SseDecoder::new();
        let events = dec.push(b"data: {\"a\":1}\n\ndata: {\"b\":2}\n");
        assert_eq!(
            events,
            vec![
                SseEvent::Data("{\"a\":1}".into()),
                SseEvent::Data("{\"b\":2}".into()),
            ]
        );
    }

    #[test]
    fn done_sentinel() {
        let mut dec = SseDecoder::new();
        assert_eq!(dec.push(b"data: [DONE]\n"), vec![SseEvent::Done]);
    }

    #[test]
    fn record_split_across_chunks() {
        let mut dec = SseDecoder::new();
        assert!(dec.push(b"data: {\"cont").is_empty());
        let events = dec.push(b"ent\":\"hi\"}\n");
        assert_eq!(events, vec![SseEvent::Data("{\"content\":\"hi\"}".into())]);
    }

    #[test]
    fn multibyte_char_split_across_chunks() {
        let payload = "data: 晴空塔\n".as_bytes();
        // Cut inside the first multi-byte character.
        let mut dec = SseDecoder::new();
        assert!(dec.push(&payload[..8]).is_empty());
        let events = dec.push(&payload[8..]);
        assert_eq!(events, vec![SseEvent::Data("晴空塔".into())]);
    }

    #[test]
    fn ignores_comments_events_and_blanks() {
        let mut dec = SseDecoder::new();
        let events = dec.push(b": keep-alive\n\nevent: message\ndata: x\n");
        assert_eq!(events, vec![SseEvent::Data("x".into())]);
    }

    #[test]
    fn crlf_lines() {
        let mut dec = SseDecoder::new();
        let events = dec.push(b"data: y\r\n");
        assert_eq!(events, vec![SseEvent::Data("y".into())]);
    }
}
