/// Non-owning read-only view over a mangled name.
///
/// All operations are total: peeking past the end yields NUL and skipping
/// saturates at the end, so the parsers never need bounds checks of their
/// own.
#[derive(Debug, Clone, Copy)]
pub struct Input<'input> {
    string: &'input [u8],
}

impl<'input> Input<'input> {
    #[must_use]
    pub fn new(string: &'input [u8]) -> Self {
        Self { string }
    }

    /// Number of unconsumed bytes.
    #[must_use]
    pub fn chars_remaining(&self) -> usize {
        self.string.len()
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.string.is_empty()
    }

    /// The unconsumed tail.
    #[must_use]
    pub fn as_bytes(&self) -> &'input [u8] {
        self.string
    }

    /// Byte at `index` ahead of the cursor, NUL when out of range.
    #[must_use]
    pub fn peek(&self, index: usize) -> u8 {
        self.string.get(index).copied().unwrap_or(b'\0')
    }

    pub fn skip(&mut self, count: usize) {
        let count = count.min(self.string.len());
        self.string = &self.string[count..];
    }

    #[must_use]
    pub fn has_prefix(&self, prefix: u8) -> bool {
        self.string.first() == Some(&prefix)
    }

    #[must_use]
    pub fn has_str_prefix(&self, prefix: &str) -> bool {
        self.string.starts_with(prefix.as_bytes())
    }

    pub fn skip_prefix(&mut self, prefix: u8) -> bool {
        if self.has_prefix(prefix) {
            self.string = &self.string[1..];
            true
        } else {
            false
        }
    }

    pub fn skip_str_prefix(&mut self, prefix: &str) -> bool {
        if self.has_str_prefix(prefix) {
            self.string = &self.string[prefix.len()..];
            true
        } else {
            false
        }
    }
}

#[test]
fn test_input_bounds() {
    let mut input = Input::new(b"_Z3foo");
    assert_eq!(input.chars_remaining(), 6);
    assert_eq!(input.peek(0), b'_');
    assert_eq!(input.peek(5), b'o');
    assert_eq!(input.peek(6), b'\0');
    assert_eq!(input.peek(1000), b'\0');

    assert!(input.has_str_prefix("_Z"));
    assert!(!input.has_str_prefix("_Z3fooX"));
    assert!(input.skip_str_prefix("_Z"));
    assert!(!input.skip_prefix(b'4'));
    assert!(input.skip_prefix(b'3'));
    assert_eq!(input.as_bytes(), b"foo");

    input.skip(100);
    assert!(input.is_at_end());
    assert_eq!(input.peek(0), b'\0');
    assert!(!input.skip_prefix(b'f'));
}
