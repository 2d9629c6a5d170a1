/// Result of feeding a line terminator to a [`LineAssembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A complete, non-empty line (terminator excluded).
    Line(String),
    /// A line exceeded the length cap and was thrown away.
    Discarded { len: usize },
}

/// Assembles serial bytes into lines delimited by CR or LF.
///
/// Empty lines (including the LF of a CRLF pair) produce nothing.
#[derive(Debug, Clone)]
pub struct LineAssembler {
    buf: Vec<u8>,
    max_len: usize,
    overflow: usize,
}

impl LineAssembler {
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(max_len.min(256)),
            max_len,
            overflow: 0,
        }
    }

    /// Feed one byte. Returns an event when a terminator closes a line.
    pub fn push(&mut self, byte: u8) -> Option<LineEvent> {
        if byte == b'\r' || byte == b'\n' {
            return self.finish();
        }

        if self.overflow > 0 || self.buf.len() >= self.max_len {
            self.overflow += 1;
        } else {
            self.buf.push(byte);
        }
        None
    }

    /// Bytes buffered for the line in progress.
    pub fn pending(&self) -> usize {
        self.buf.len() + self.overflow
    }

    fn finish(&mut self) -> Option<LineEvent> {
        if self.overflow > 0 {
            let len = self.buf.len() + self.overflow;
            self.buf.clear();
            self.overflow = 0;
            return Some(LineEvent::Discarded { len });
        }
        if self.buf.is_empty() {
            return None;
        }

        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Some(LineEvent::Line(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(assembler: &mut LineAssembler, input: &[u8]) -> Vec<LineEvent> {
        input.iter().filter_map(|b| assembler.push(*b)).collect()
    }

    #[test]
    fn splits_on_cr_and_lf() {
        let mut a = LineAssembler::new(64);
        let events = feed(&mut a, b"one\rtwo\nthree\r\n");
        assert_eq!(
            events,
            vec![
                LineEvent::Line("one".into()),
                LineEvent::Line("two".into()),
                LineEvent::Line("three".into()),
            ]
        );
        assert_eq!(a.pending(), 0);
    }

    #[test]
    fn empty_lines_are_skipped() {
        let mut a = LineAssembler::new(64);
        assert!(feed(&mut a, b"\r\n\n\r").is_empty());
    }

    #[test]
    fn partial_line_waits_for_terminator() {
        let mut a = LineAssembler::new(64);
        assert!(feed(&mut a, b"SETORD").is_empty());
        assert_eq!(a.pending(), 6);
        assert_eq!(
            feed(&mut a, b"ER,1,TLHP\n"),
            vec![LineEvent::Line("SETORDER,1,TLHP".into())]
        );
    }

    #[test]
    fn overlong_line_is_discarded_whole() {
        let mut a = LineAssembler::new(4);
        let events = feed(&mut a, b"abcdefgh\nok\n");
        assert_eq!(
            events,
            vec![LineEvent::Discarded { len: 8 }, LineEvent::Line("ok".into())]
        );
    }

    #[test]
    fn exact_length_line_is_kept() {
        let mut a = LineAssembler::new(4);
        assert_eq!(feed(&mut a, b"abcd\n"), vec![LineEvent::Line("abcd".into())]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut a = LineAssembler::new(16);
        let events = feed(&mut a, &[b'a', 0xFF, b'b', b'\n']);
        assert_eq!(events, vec![LineEvent::Line("a\u{FFFD}b".into())]);
    }
}
