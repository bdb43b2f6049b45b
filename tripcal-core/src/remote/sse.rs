//! Incremental parser for `text/event-stream` bodies.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Feed raw body chunks in, get complete events out. Chunks may split lines
/// (and multi-byte characters) anywhere.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: String,
    data: Vec<String>,
}

impl SseParser {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
                continue;
            }

            // Comment line
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };

            match field {
                "event" => self.event = value.to_string(),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }

        events
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.event.is_empty() && self.data.is_empty() {
            return None;
        }

        let event = if self.event.is_empty() {
            "message".to_string()
        } else {
            std::mem::take(&mut self.event)
        };
        let data = std::mem::take(&mut self.data).join("\n");

        Some(SseEvent { event, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_firebase_put_event() {
        let mut parser = SseParser::default();
        let events = parser.push(b"event: put\ndata: {\"path\":\"/\",\"data\":null}\n\n");

        assert_eq!(
            events,
            vec![SseEvent {
                event: "put".into(),
                data: "{\"path\":\"/\",\"data\":null}".into(),
            }]
        );
    }

    #[test]
    fn handles_lines_split_across_chunks() {
        let mut parser = SseParser::default();

        assert!(parser.push(b"event: pa").is_empty());
        assert!(parser.push(b"tch\r\ndata: {\"pa").is_empty());
        let events = parser.push(b"th\":\"/0\"}\r\n\r\nevent: keep-alive\ndata: null\n\n");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "patch");
        assert_eq!(events[0].data, "{\"path\":\"/0\"}");
        assert_eq!(events[1].event, "keep-alive");
    }

    #[test]
    fn keeps_multibyte_characters_intact() {
        let mut parser = SseParser::default();
        let payload = "data: 増田ビル\n\n".as_bytes();
        let (a, b) = payload.split_at(8);

        assert!(parser.push(a).is_empty());
        let events = parser.push(b);
        assert_eq!(events[0].data, "増田ビル");
        assert_eq!(events[0].event, "message");
    }

    #[test]
    fn joins_multiline_data_and_skips_comments() {
        let mut parser = SseParser::default();
        let events = parser.push(b": hello\ndata: a\ndata: b\n\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "a\nb");
    }
}
