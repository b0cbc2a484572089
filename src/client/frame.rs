use serde_json::Value;

/// Marker that starts every content-bearing line.
pub const DATA_PREFIX: &str = "data: ";

/// Advisory end-of-stream marker. Closure of the connection is what actually
/// ends a stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One line of the relayed stream, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(Value),
    Done,
    /// Blank separators, comments, and any other non-`data:` line.
    Ignored,
    Malformed { payload: String, reason: String },
}

pub fn parse_line(line: &str) -> Frame {
    let line = line.trim();
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Ignored;
    };

    if payload.trim() == DONE_SENTINEL {
        return Frame::Done;
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(event) => Frame::Event(event),
        Err(e) => Frame::Malformed {
            payload: payload.to_string(),
            reason: e.to_string(),
        },
    }
}

/// Text fragment carried by one event.
///
/// Streaming chunks put it under `choices[0].delta.content`; some providers
/// send whole messages under `message.content`. Empty strings count as absent.
pub fn extract_fragment(event: &Value) -> Option<&str> {
    fn non_empty(v: &Value) -> Option<&str> {
        v.as_str().filter(|s| !s.is_empty())
    }

    event
        .pointer("/choices/0/delta/content")
        .and_then(non_empty)
        .or_else(|| event.pointer("/message/content").and_then(non_empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_data_lines_are_ignored() {
        assert_eq!(parse_line(""), Frame::Ignored);
        assert_eq!(parse_line(": OPENROUTER PROCESSING"), Frame::Ignored);
        assert_eq!(parse_line("event: message"), Frame::Ignored);
        assert_eq!(parse_line("data:{\"a\":1}"), Frame::Ignored);
    }

    #[test]
    fn test_done_sentinel() {
        assert_eq!(parse_line("data: [DONE]"), Frame::Done);
        assert_eq!(parse_line("  data: [DONE]\r"), Frame::Done);
    }

    #[test]
    fn test_event_line() {
        let frame = parse_line("data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\r");
        assert_eq!(
            frame,
            Frame::Event(json!({"choices": [{"delta": {"content": "Hi"}}]}))
        );
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(
            parse_line("data: {\"choices\":[{\"delta\""),
            Frame::Malformed { .. }
        ));
    }

    #[test]
    fn test_fragment_shapes() {
        let delta = json!({"choices": [{"delta": {"content": "The de"}}]});
        assert_eq!(extract_fragment(&delta), Some("The de"));

        let message = json!({"message": {"content": "whole answer"}});
        assert_eq!(extract_fragment(&message), Some("whole answer"));

        let empty_delta = json!({"choices": [{"delta": {"content": ""}}], "message": {"content": "x"}});
        assert_eq!(extract_fragment(&empty_delta), Some("x"));
    }

    #[test]
    fn test_event_without_content() {
        let role_only = json!({"choices": [{"delta": {"role": "assistant"}}]});
        assert_eq!(extract_fragment(&role_only), None);

        let usage = json!({"choices": [], "usage": {"total_tokens": 12}});
        assert_eq!(extract_fragment(&usage), None);

        assert_eq!(extract_fragment(&json!({"choices": "nope"})), None);
    }
}
