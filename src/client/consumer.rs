use super::decoder::Utf8StreamDecoder;
use super::frame::{extract_fragment, parse_line, Frame};

/// Reassembles a relayed completion stream into a running answer.
///
/// Bytes are decoded statefully and split on `\n`; a line is only parsed
/// once its terminating newline has arrived, so an event that straddles two
/// network reads is parsed whole. Every appended fragment republishes the
/// complete answer so far.
#[derive(Debug, Default)]
pub struct StreamConsumer {
    decoder: Utf8StreamDecoder,
    buffer: String,
    answer: String,
    saw_done: bool,
    skipped: usize,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network read. `on_update` receives the full answer after
    /// each appended fragment.
    pub fn feed<F>(&mut self, bytes: &[u8], mut on_update: F)
    where
        F: FnMut(&str),
    {
        let text = self.decoder.decode(bytes);
        self.buffer.push_str(&text);

        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            self.process_line(&line, &mut on_update);
        }
    }

    /// End of stream: flush the decoder, process any unterminated last line,
    /// and hand back the final answer. Closure completes the stream whether
    /// or not `[DONE]` was seen.
    pub fn finish<F>(mut self, mut on_update: F) -> String
    where
        F: FnMut(&str),
    {
        let tail = self.decoder.finish();
        self.buffer.push_str(&tail);

        let rest = std::mem::take(&mut self.buffer);
        for line in rest.split('\n') {
            self.process_line(line, &mut on_update);
        }

        if !self.saw_done {
            tracing::debug!("Stream closed without [DONE] marker");
        }
        if self.skipped > 0 {
            tracing::debug!("Stream finished with {} malformed frame(s) skipped", self.skipped);
        }

        self.answer
    }

    fn process_line<F>(&mut self, line: &str, on_update: &mut F)
    where
        F: FnMut(&str),
    {
        match parse_line(line) {
            Frame::Event(event) => {
                if let Some(fragment) = extract_fragment(&event) {
                    self.answer.push_str(fragment);
                    on_update(&self.answer);
                }
            }
            Frame::Done => self.saw_done = true,
            Frame::Ignored => {}
            Frame::Malformed { payload, reason } => {
                self.skipped += 1;
                tracing::warn!("Failed to parse chunk: {payload} ({reason})");
            }
        }
    }
}
