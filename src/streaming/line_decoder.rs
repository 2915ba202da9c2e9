//! Line reassembly over transport frames.
//!
//! Frames arrive with arbitrary boundaries. Bytes are buffered until a `\n`
//! terminator is seen, so a logical line may span any number of frames and a
//! multi-byte UTF-8 sequence split between two frames still decodes cleanly
//! (`\n` never occurs inside a multi-byte sequence).

use crate::error::LlmError;
use bytes::BytesMut;

/// Splits a byte stream into text lines, carrying the unterminated tail of
/// each frame into the next one.
#[derive(Debug)]
pub struct LineDecoder {
    buffer: BytesMut,
    // Bytes of `buffer` already known to contain no terminator.
    scanned: usize,
    max_line_bytes: usize,
}

impl LineDecoder {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            scanned: 0,
            max_line_bytes,
        }
    }

    /// Feed one frame and return every line it completes, in arrival order.
    ///
    /// Line terminators (`\n` or `\r\n`) are stripped. Fails when the
    /// unterminated tail grows beyond the configured line limit.
    pub fn push(&mut self, frame: &[u8]) -> Result<Vec<String>, LlmError> {
        self.buffer.extend_from_slice(frame);

        let mut lines = Vec::new();
        loop {
            let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n')
            else {
                break;
            };
            let end = self.scanned + offset;
            let raw = self.buffer.split_to(end + 1);
            self.scanned = 0;

            let mut line = &raw[..end];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            lines.push(String::from_utf8_lossy(line).into_owned());
        }
        self.scanned = self.buffer.len();

        if self.buffer.len() > self.max_line_bytes {
            return Err(LlmError::StreamError(format!(
                "line exceeds {} bytes without a terminator",
                self.max_line_bytes
            )));
        }
        Ok(lines)
    }

    /// End of stream. An unterminated tail is not a complete event and is
    /// discarded; returns how many bytes were dropped.
    pub fn finish(self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> LineDecoder {
        LineDecoder::new(1024)
    }

    #[test]
    fn splits_complete_lines_within_one_frame() {
        let mut d = decoder();
        let lines = d.push(b"data: a\ndata: b\n").unwrap();
        assert_eq!(lines, vec!["data: a", "data: b"]);
        assert_eq!(d.finish(), 0);
    }

    #[test]
    fn carries_partial_line_into_next_frame() {
        let mut d = decoder();
        assert_eq!(d.push(b"data: {\"a\"").unwrap(), Vec::<String>::new());
        assert_eq!(d.push(b":1}\ndata: ").unwrap(), vec!["data: {\"a\":1}"]);
        assert_eq!(d.push(b"x\n").unwrap(), vec!["data: x"]);
    }

    #[test]
    fn reassembles_line_spanning_many_frames() {
        let mut d = decoder();
        for piece in ["da", "ta", ": ", "hel", "lo"] {
            assert!(d.push(piece.as_bytes()).unwrap().is_empty());
        }
        assert_eq!(d.push(b"\n").unwrap(), vec!["data: hello"]);
    }

    #[test]
    fn strips_carriage_returns() {
        let mut d = decoder();
        assert_eq!(d.push(b"a\r\n\r\nb\r").unwrap(), vec!["a", ""]);
        assert_eq!(d.push(b"\n").unwrap(), vec!["b"]);
    }

    #[test]
    fn multibyte_sequences_split_across_frames_decode_cleanly() {
        let text = "héllo 世界\n".as_bytes();
        let mut d = decoder();
        let mut out = Vec::new();
        for byte in text {
            out.extend(d.push(std::slice::from_ref(byte)).unwrap());
        }
        assert_eq!(out, vec!["héllo 世界"]);
    }

    #[test]
    fn unterminated_tail_is_dropped_at_end() {
        let mut d = decoder();
        assert_eq!(d.push(b"one\ntwo").unwrap(), vec!["one"]);
        assert_eq!(d.finish(), 3);
    }

    #[test]
    fn overlong_line_fails() {
        let mut d = LineDecoder::new(8);
        assert!(d.push(b"12345").is_ok());
        let err = d.push(b"67890").unwrap_err();
        assert!(matches!(err, LlmError::StreamError(_)));
    }

    #[test]
    fn long_frame_of_short_lines_is_within_limit() {
        let mut d = LineDecoder::new(8);
        let lines = d.push(b"aaaa\nbbbb\ncccc\ndddd\n").unwrap();
        assert_eq!(lines.len(), 4);
    }
}
