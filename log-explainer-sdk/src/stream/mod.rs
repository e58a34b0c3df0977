//! Incremental event-stream decoding
//!
//! The decoder consumes arbitrary byte chunks as they arrive from the
//! network and yields complete events. Event boundaries do not line up with
//! read boundaries, so unfinished lines are carried over between calls. The
//! decoder never touches the network and can be driven directly in tests.
//!
//! Wire format: events are blocks of lines separated by a blank line. An
//! `event: <name>` line names the event, every `data: <fragment>` line
//! appends to the payload (fragments are concatenated without a separator),
//! lines starting with `:` are comments. `\n`, `\r\n` and `\r` all end a
//! line.

mod event;
pub use event::StreamEvent;

/// A complete event block before its payload is interpreted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawEvent {
    /// Value of the `event:` line, if any
    pub event: Option<String>,

    /// Concatenated `data:` fragments
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// No event fields buffered; waiting for the first field line
    CollectingLine,
    /// At least one field buffered; waiting for the blank line
    CollectingEvent,
}

/// Chunk-boundary-invariant event-stream decoder
#[derive(Debug)]
pub struct EventStreamDecoder {
    state: DecoderState,
    /// Bytes of the line currently being read
    line: Vec<u8>,
    /// Previous chunk ended on `\r`; a leading `\n` belongs to it
    pending_cr: bool,
    event: Option<String>,
    data: String,
}

impl Default for EventStreamDecoder {
    fn default() -> Self {
        Self {
            state: DecoderState::CollectingLine,
            line: Vec::new(),
            pending_cr: false,
            event: None,
            data: String::new(),
        }
    }
}

impl EventStreamDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of bytes and return every event it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RawEvent> {
        let mut events = Vec::new();

        for &byte in chunk {
            match byte {
                b'\n' if self.pending_cr => {
                    self.pending_cr = false;
                }
                b'\n' => {
                    self.end_line(&mut events);
                }
                b'\r' => {
                    self.end_line(&mut events);
                    self.pending_cr = true;
                }
                other => {
                    self.pending_cr = false;
                    self.line.push(other);
                }
            }
        }

        events
    }

    /// Feed a chunk and decode the completed events, dropping malformed ones
    pub fn feed_events(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        decode_all(self.feed(chunk))
    }

    /// Signal end of input and flush an event left without a closing blank line
    pub fn finish(&mut self) -> Option<RawEvent> {
        let mut events = Vec::new();
        if !self.line.is_empty() {
            self.end_line(&mut events);
        }
        self.pending_cr = false;

        events.pop().or_else(|| self.flush())
    }

    /// Whether a partial line or event is still buffered
    pub fn has_pending(&self) -> bool {
        !self.line.is_empty() || self.state == DecoderState::CollectingEvent
    }

    fn end_line(&mut self, events: &mut Vec<RawEvent>) {
        let bytes = std::mem::take(&mut self.line);

        if bytes.is_empty() {
            if let Some(event) = self.flush() {
                events.push(event);
            }
            return;
        }

        let line = String::from_utf8_lossy(&bytes);
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.find(':') {
            Some(idx) => {
                let value = &line[idx + 1..];
                (&line[..idx], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (&line[..], ""),
        };

        match field {
            "event" => {
                self.event = Some(value.to_string());
                self.state = DecoderState::CollectingEvent;
            }
            "data" => {
                self.data.push_str(value);
                self.state = DecoderState::CollectingEvent;
            }
            // id/retry and unknown fields carry nothing this client uses
            _ => {}
        }
    }

    fn flush(&mut self) -> Option<RawEvent> {
        if self.state != DecoderState::CollectingEvent {
            return None;
        }

        self.state = DecoderState::CollectingLine;
        Some(RawEvent {
            event: self.event.take(),
            data: std::mem::take(&mut self.data),
        })
    }
}

/// Decode raw events into typed ones, dropping unknown and malformed events
pub fn decode_all(raw_events: Vec<RawEvent>) -> Vec<StreamEvent> {
    raw_events
        .iter()
        .filter_map(|raw| match StreamEvent::decode(raw) {
            Ok(event) => event,
            Err(e) => {
                log::debug!("Discarding malformed stream event: {}", e);
                None
            }
        })
        .collect()
}
