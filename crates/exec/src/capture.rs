//! Bounded capture of one output stream

use parking_lot::Mutex;
use repro_core::{ConsoleSink, Stream};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;

/// Retained text of a stream, up to a byte cap
#[derive(Debug)]
pub(crate) struct StreamCapture {
    text: String,
    cap: usize,
    dropped_bytes: usize,
}

impl StreamCapture {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            text: String::new(),
            cap,
            dropped_bytes: 0,
        }
    }

    /// Retain `line` if it fits entirely under the cap
    pub(crate) fn push_line(&mut self, line: &str) {
        let needed = line.len() + 1;
        if self.dropped_bytes == 0 && self.text.len() + needed <= self.cap {
            self.text.push_str(line);
            self.text.push('\n');
        } else {
            self.dropped_bytes += needed;
        }
    }

    pub(crate) fn truncated(&self) -> bool {
        self.dropped_bytes > 0
    }

    /// Retained text, with a marker line when anything was dropped
    pub(crate) fn finish(&self) -> String {
        if self.truncated() {
            format!(
                "{}[output truncated: {} bytes past the {}-byte capture limit were not retained]\n",
                self.text, self.dropped_bytes, self.cap
            )
        } else {
            self.text.clone()
        }
    }
}

/// Bytes requested from the pipe per read
const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Longest partial line held before it is flushed as its own segment
const MAX_PENDING_LINE_BYTES: usize = 64 * 1024;

/// Splits raw chunks into lines, holding at most `limit` bytes of an
/// unterminated line
#[derive(Debug)]
pub(crate) struct LineSplitter {
    pending: Vec<u8>,
    limit: usize,
}

impl LineSplitter {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            pending: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub(crate) fn feed(&mut self, chunk: &[u8], emit: &mut impl FnMut(&[u8])) {
        for piece in chunk.split_inclusive(|b| *b == b'\n') {
            let (body, terminated) = match piece.split_last() {
                Some((&b'\n', body)) => (body, true),
                _ => (piece, false),
            };
            self.pending.extend_from_slice(body);
            while self.pending.len() > self.limit {
                let at = char_boundary(&self.pending, self.limit);
                emit(&self.pending[..at]);
                self.pending.drain(..at);
            }
            if terminated {
                emit(&self.pending);
                self.pending.clear();
            }
        }
    }

    /// Emit whatever is left once the stream has ended
    pub(crate) fn finish(&mut self, emit: &mut impl FnMut(&[u8])) {
        if !self.pending.is_empty() {
            emit(&self.pending);
            self.pending.clear();
        }
    }
}

/// Largest cut point at or below `limit` that does not split a UTF-8 sequence
fn char_boundary(bytes: &[u8], limit: usize) -> usize {
    let mut at = limit.min(bytes.len());
    while at > 0 && at < bytes.len() && (bytes[at] & 0xC0) == 0x80 {
        at -= 1;
    }
    if at == 0 {
        limit.min(bytes.len())
    } else {
        at
    }
}

/// Drain `reader` in fixed-size chunks into `capture`, mirroring each line
/// to the console
///
/// Reading continues past the cap so the child never blocks on a full pipe.
/// Memory held per stream is bounded by the cap plus one pending line.
pub(crate) fn spawn_drain<R>(
    mut reader: R,
    stream: Stream,
    capture: Arc<Mutex<StreamCapture>>,
    console: Arc<dyn ConsoleSink>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let limit = capture
            .lock()
            .cap
            .clamp(READ_CHUNK_BYTES, MAX_PENDING_LINE_BYTES);
        let mut splitter = LineSplitter::new(limit);
        let mut emit = |bytes: &[u8]| {
            let line = String::from_utf8_lossy(bytes);
            let line = line.trim_end_matches('\r');
            console.output(stream, line);
            capture.lock().push_line(line);
        };

        let mut buf = vec![0u8; READ_CHUNK_BYTES];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => splitter.feed(&buf[..n], &mut emit),
                Err(e) => {
                    tracing::debug!(?stream, error = %e, "output stream closed with error");
                    break;
                }
            }
        }
        splitter.finish(&mut emit);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_under_cap() {
        let mut capture = StreamCapture::new(100);
        capture.push_line("hello");
        capture.push_line("world");
        assert!(!capture.truncated());
        assert_eq!(capture.finish(), "hello\nworld\n");
    }

    #[test]
    fn test_capture_truncates_and_marks() {
        let mut capture = StreamCapture::new(10);
        capture.push_line("12345");
        capture.push_line("678901");
        // Later lines that would fit are dropped too so the retained prefix stays contiguous
        capture.push_line("x");
        assert!(capture.truncated());
        let text = capture.finish();
        assert!(text.starts_with("12345\n[output truncated: 9 bytes"));
    }

    fn split(limit: usize, chunks: &[&[u8]]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut emit = |bytes: &[u8]| lines.push(String::from_utf8_lossy(bytes).into_owned());
        let mut splitter = LineSplitter::new(limit);
        for chunk in chunks {
            splitter.feed(chunk, &mut emit);
        }
        splitter.finish(&mut emit);
        lines
    }

    #[test]
    fn test_splitter_joins_lines_across_chunks() {
        let lines = split(64, &[b"hel", b"lo\nwor", b"ld\n\nlast"]);
        assert_eq!(lines, vec!["hello", "world", "", "last"]);
    }

    #[test]
    fn test_splitter_bounds_unterminated_line() {
        let long = vec![b'a'; 10_000];
        let lines = split(1024, &[&long[..4000], &long[4000..]]);
        assert!(lines.iter().all(|l| l.len() <= 1024));
        assert_eq!(lines.iter().map(String::len).sum::<usize>(), 10_000);
    }

    #[test]
    fn test_splitter_keeps_multibyte_characters_whole() {
        let text = "é".repeat(10);
        let lines = split(5, &[text.as_bytes()]);
        assert!(lines.iter().all(|l| !l.contains('\u{FFFD}')));
        assert_eq!(lines.concat(), text);
    }

    #[tokio::test]
    async fn test_drain_caps_long_line_without_newline() {
        let console = Arc::new(repro_core::MemoryConsole::new());
        let capture = Arc::new(Mutex::new(StreamCapture::new(1024)));
        let input = std::io::Cursor::new(vec![b'a'; 1_000_000]);
        let sink: Arc<dyn ConsoleSink> = console.clone();

        spawn_drain(input, Stream::Stdout, Arc::clone(&capture), sink)
            .await
            .unwrap();

        let capture = capture.lock();
        assert!(capture.truncated());
        assert!(capture.text.len() <= 1024);
        let mirrored = console.lines(Stream::Stdout);
        assert!(mirrored.iter().all(|l| l.len() <= MAX_PENDING_LINE_BYTES));
        assert_eq!(mirrored.iter().map(String::len).sum::<usize>(), 1_000_000);
    }
}
