//! Minimal server-sent-event frame extraction.
//!
//! Remote MCP servers answer a POST with a body such as:
//!
//! ```text
//! event: message
//! data: {"jsonrpc":"2.0","id":1,"result":{...}}
//! ```
//!
//! Only the JSON object carried by a `data:` line matters. The rules:
//!
//! - the first `data:` line whose payload is a JSON object (`{...}` on one
//!   line) wins; later frames are ignored
//! - `data:` lines carrying anything else are skipped
//! - the `event:` line preceding the winning frame is recorded, for logging
//! - multi-line `data:` continuations, `id:` and `retry:` fields are not
//!   supported
//! - `\r\n` line endings are accepted

/// A single frame extracted from a stream body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Name from the most recent `event:` line in the same block
    pub event: Option<&'a str>,
    /// JSON object text after `data:`
    pub data: &'a str,
}

/// Find the first frame carrying a JSON object.
pub fn first_frame(body: &str) -> Option<Frame<'_>> {
    let mut event = None;

    for line in body.lines() {
        let line = line.trim_end_matches('\r');

        if line.is_empty() {
            // Blank line ends an event block.
            event = None;
            continue;
        }

        if let Some(name) = field_value(line, "event") {
            event = Some(name.trim());
            continue;
        }

        if let Some(data) = field_value(line, "data") {
            let data = data.trim_end();
            if data.starts_with('{') && data.ends_with('}') {
                return Some(Frame { event, data });
            }
        }
    }

    None
}

/// Value of an SSE field line (`name:value`, one optional space after the colon).
fn field_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}
