/// Position inside the decoded buffer
///
/// Cursors are cheap to copy, so a parser can try a construct and simply drop
/// the cursor when the construct turns out to be incomplete.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Cursor<'a> {
    rest: &'a str,
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            rest: input,
            offset: 0,
        }
    }

    pub fn next_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    pub fn next_byte(&self, i: usize) -> Option<u8> {
        self.rest.as_bytes().get(i).copied()
    }

    #[inline]
    pub fn has_next_byte(&self, pat: u8) -> bool {
        self.rest.as_bytes().first() == Some(&pat)
    }

    #[inline]
    pub fn has_next_str(&self, pat: impl AsRef<str>) -> bool {
        self.rest.starts_with(pat.as_ref())
    }

    /// Offset in bytes from the start of the buffer
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rest(&self) -> &'a str {
        self.rest
    }

    pub fn rest_bytes(&self) -> &'a [u8] {
        self.rest.as_bytes()
    }

    pub fn is_at_end(&self) -> bool {
        self.rest.is_empty()
    }

    /// Skip `bytes` bytes, which must end on a char boundary
    pub fn advance(&self, bytes: usize) -> Self {
        self.advance2(bytes).1
    }

    /// Skip `bytes` bytes and return the skipped string
    pub fn advance2(&self, bytes: usize) -> (&'a str, Self) {
        let (skipped, rest) = self.rest.split_at(bytes);
        (
            skipped,
            Self {
                rest,
                offset: self.offset + bytes,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_keeps_offset() {
        let cursor = Cursor::new("<a>ä</a>");
        let (skipped, cursor) = cursor.advance2(3);
        assert_eq!("<a>", skipped);
        assert_eq!(Some('ä'), cursor.next_char());
        let cursor = cursor.advance('ä'.len_utf8());
        assert_eq!(5, cursor.offset());
        assert!(cursor.has_next_str("</"));
        assert!(cursor.advance(cursor.rest().len()).is_at_end());
    }
}
