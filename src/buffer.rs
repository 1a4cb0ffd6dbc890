/// Fixed-capacity output writer for demangled names.
///
/// The buffer never grows. The first append that would exceed the capacity
/// latches an overflow flag and is dropped, as is every append after it;
/// the content written before the overflow stays valid. Overflow is
/// reported at the end of demangling, distinct from a parse failure.
#[derive(Debug)]
pub struct NameBuffer {
    buffer: Vec<u8>,
    size: usize,
    overflow: bool,
}

impl NameBuffer {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(size),
            size,
            overflow: false,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// The most recently appended byte, NUL on an empty buffer.
    #[must_use]
    pub fn last_char(&self) -> u8 {
        self.buffer.last().copied().unwrap_or(b'\0')
    }

    #[must_use]
    pub fn had_overflow(&self) -> bool {
        self.overflow
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) -> bool {
        // The capacity reserves one byte for the terminator, matching the
        // C convention callers size their buffers for.
        if self.buffer.len() + bytes.len() >= self.size {
            self.overflow = true;
            return false;
        }

        self.buffer.extend_from_slice(bytes);
        true
    }

    pub fn append(&mut self, string: &str) -> bool {
        self.append_bytes(string.as_bytes())
    }

    pub fn append_char(&mut self, c: u8) -> bool {
        self.append_bytes(&[c])
    }

    /// Drop the content and the overflow latch, keeping the capacity.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.overflow = false;
    }

    /// Finish writing and view the accumulated name.
    ///
    /// The content is valid UTF-8 by construction: every append is either
    /// a `&str` or a byte range taken verbatim from the ASCII mangled
    /// input.
    #[must_use]
    pub fn terminate(&self) -> &str {
        std::str::from_utf8(&self.buffer).unwrap_or("")
    }
}

#[test]
fn test_buffer_overflow_latches() {
    let mut buffer = NameBuffer::new(8);
    assert_eq!(buffer.last_char(), b'\0');
    assert!(buffer.append("foo"));
    assert_eq!(buffer.last_char(), b'o');
    assert!(!buffer.append("toolong"));
    assert!(buffer.had_overflow());

    // later writes drop silently, even ones that would fit
    assert!(!buffer.append("x"));
    assert_eq!(buffer.last_char(), b'o');
    assert_eq!(buffer.terminate(), "foo");
}

#[test]
fn test_buffer_zero_capacity() {
    let mut buffer = NameBuffer::new(0);
    assert!(!buffer.append(""));
    assert!(buffer.had_overflow());
    assert_eq!(buffer.terminate(), "");
}

#[test]
fn test_buffer_exact_fit() {
    // capacity counts the terminator, so 4 bytes hold a 3-byte name
    let mut buffer = NameBuffer::new(4);
    assert!(buffer.append("abc"));
    assert!(!buffer.append_char(b'd'));
    assert_eq!(buffer.terminate(), "abc");
}
